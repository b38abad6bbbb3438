//! Device paths
//!
//! A UEFI device path is a very flexible structure for encoding a
//! programmatic path such as a hard drive or console. Load options embed
//! one to say where the boot image lives.
//!
//! A device path is made up of a packed list of variable-length nodes of
//! various types. The entire device path is terminated with an
//! [`END_ENTIRE`] node. A device path _may_ contain multiple device-path
//! instances separated by [`END_INSTANCE`] nodes, but typical paths contain
//! only a single instance (in which case no `END_INSTANCE` node is needed).
//!
//! Example of what a device path containing two instances (each comprised of
//! three nodes) might look like:
//!
//! ```text
//! ┌──────┬─────┬──────────────╥───────┬──────────┬────────────┐
//! │ ACPI │ PCI │ END_INSTANCE ║ CDROM │ FILEPATH │ END_ENTIRE │
//! └──────┴─────┴──────────────╨───────┴──────────┴────────────┘
//! ↑                           ↑                               ↑
//! ├─── DevicePathInstance ────╨────── DevicePathInstance ─────┤
//! │                                                           │
//! └─────────────────── Entire DevicePath ─────────────────────┘
//! ```
//!
//! The types in this module borrow the raw bytes they describe; nothing is
//! copied and nodes may appear on any byte boundary. [`DevicePath::new`]
//! checks the structure of the whole path up front, so iterating over a
//! [`DevicePath`] cannot fail.
//!
//! The file path list of a load option may pack several entire device
//! paths one after the other. [`DevicePath::new`] accepts such a list as
//! long as it ends with an [`END_ENTIRE`] node, and
//! [`DevicePath::instance_iter`] walks every instance of every packed path.
//!
//! Only reading is supported. There is no API to build or edit a path.
//!
//! [`END_ENTIRE`]: DeviceSubType::END_ENTIRE
//! [`END_INSTANCE`]: DeviceSubType::END_INSTANCE

pub mod text;

pub use text::to_text;

/// Errors found while validating the structure of a device path.
#[derive(Clone, Copy, Debug, Eq, PartialEq, thiserror::Error)]
pub enum DevicePathError {
    /// There are no nodes at all.
    #[error("device path is empty")]
    Empty,

    /// The bytes end in the middle of a node header.
    #[error("truncated device path node header at offset {offset}")]
    TruncatedHeader {
        /// Offset of the node.
        offset: usize,
    },

    /// A node's length is smaller than its header or runs past the end of
    /// the data.
    #[error("device path node at offset {offset} has invalid length {length}")]
    InvalidNodeLength {
        /// Offset of the node.
        offset: usize,
        /// Length claimed by the node's header.
        length: u16,
    },

    /// The last node is not an [`END_ENTIRE`] node.
    ///
    /// [`END_ENTIRE`]: DeviceSubType::END_ENTIRE
    #[error("device path is not terminated by an end-entire node")]
    MissingEnd,
}

/// Header that appears at the start of every [`DevicePathNode`].
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct DevicePathHeader {
    /// Type of device
    pub device_type: DeviceType,
    /// Sub type of device
    pub sub_type: DeviceSubType,
    /// Size (in bytes) of the [`DevicePathNode`], including this header.
    pub length: u16,
}

impl DevicePathHeader {
    /// Size of the header in bytes.
    pub const SIZE: usize = 4;

    /// Read a header from the start of `bytes`.
    #[must_use]
    pub fn read(bytes: &[u8]) -> Option<Self> {
        match *bytes {
            [device_type, sub_type, l0, l1, ..] => Some(Self {
                device_type: DeviceType(device_type),
                sub_type: DeviceSubType(sub_type),
                length: u16::from_le_bytes([l0, l1]),
            }),
            _ => None,
        }
    }
}

/// A single node within a [`DevicePath`].
///
/// Each node starts with a [`DevicePathHeader`]. The rest of the node's
/// data depends on its type and sub type.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct DevicePathNode<'a> {
    header: DevicePathHeader,
    data: &'a [u8],
}

impl<'a> DevicePathNode<'a> {
    /// Type of device
    #[must_use]
    pub const fn device_type(&self) -> DeviceType {
        self.header.device_type
    }

    /// Sub type of device
    #[must_use]
    pub const fn sub_type(&self) -> DeviceSubType {
        self.header.sub_type
    }

    /// Tuple of the node's type and subtype.
    #[must_use]
    pub const fn full_type(&self) -> (DeviceType, DeviceSubType) {
        (self.header.device_type, self.header.sub_type)
    }

    /// Size (in bytes) of the full [`DevicePathNode`], including the header.
    #[must_use]
    pub const fn length(&self) -> u16 {
        self.header.length
    }

    /// Node data following the header.
    #[must_use]
    pub const fn data(&self) -> &'a [u8] {
        self.data
    }

    /// True if this node ends an entire [`DevicePath`].
    #[must_use]
    pub fn is_end_entire(&self) -> bool {
        self.full_type() == (DeviceType::END, DeviceSubType::END_ENTIRE)
    }

    /// True if this node ends a [`DevicePathInstance`].
    #[must_use]
    pub fn is_end_instance(&self) -> bool {
        self.full_type() == (DeviceType::END, DeviceSubType::END_INSTANCE)
    }

    fn is_end(&self) -> bool {
        self.device_type() == DeviceType::END
    }
}

/// A single device path instance that ends with either an [`END_INSTANCE`]
/// or [`END_ENTIRE`] node. Use [`DevicePath::instance_iter`] to get the
/// path instances in a [`DevicePath`].
///
/// [`END_ENTIRE`]: DeviceSubType::END_ENTIRE
/// [`END_INSTANCE`]: DeviceSubType::END_INSTANCE
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct DevicePathInstance<'a> {
    data: &'a [u8],
}

impl<'a> DevicePathInstance<'a> {
    /// Get an iterator over the [`DevicePathNodes`] in this
    /// instance. Iteration ends when any [`DeviceType::END`] node is
    /// reached.
    ///
    /// [`DevicePathNodes`]: DevicePathNode
    #[must_use]
    pub fn node_iter(&self) -> DevicePathNodeIterator<'a> {
        DevicePathNodeIterator {
            nodes: RawNodes { data: self.data },
            stop_condition: StopCondition::AnyEndNode,
        }
    }

    /// Raw bytes of the instance, end node included.
    #[must_use]
    pub const fn as_bytes(&self) -> &'a [u8] {
        self.data
    }
}

/// Validated view of a device path in its binary encoding.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct DevicePath<'a> {
    data: &'a [u8],
}

impl<'a> DevicePath<'a> {
    /// Check the structure of `data` and wrap it.
    ///
    /// Every node must have a complete header, a length covering at least
    /// its header and staying within `data`, and the last node must be an
    /// [`END_ENTIRE`] node.
    ///
    /// [`END_ENTIRE`]: DeviceSubType::END_ENTIRE
    pub fn new(data: &'a [u8]) -> Result<Self, DevicePathError> {
        if data.is_empty() {
            return Err(DevicePathError::Empty);
        }

        let mut offset = 0;
        let mut last = None;
        while offset < data.len() {
            let header = DevicePathHeader::read(&data[offset..])
                .ok_or(DevicePathError::TruncatedHeader { offset })?;
            let length = usize::from(header.length);
            if length < DevicePathHeader::SIZE || length > data.len() - offset {
                return Err(DevicePathError::InvalidNodeLength {
                    offset,
                    length: header.length,
                });
            }
            last = Some(header);
            offset += length;
        }

        match last {
            Some(DevicePathHeader {
                device_type: DeviceType::END,
                sub_type: DeviceSubType::END_ENTIRE,
                ..
            }) => Ok(Self { data }),
            _ => Err(DevicePathError::MissingEnd),
        }
    }

    /// Raw bytes of the path.
    #[must_use]
    pub const fn as_bytes(&self) -> &'a [u8] {
        self.data
    }

    /// Get an iterator over the [`DevicePathInstance`]s in this path.
    ///
    /// When several entire paths are packed together, the instances of all
    /// of them are returned in order.
    #[must_use]
    pub fn instance_iter(&self) -> DevicePathInstanceIterator<'a> {
        DevicePathInstanceIterator {
            remaining_path: self.data,
        }
    }

    /// Get an iterator over the [`DevicePathNode`]s starting at
    /// `self`. Iteration ends when a path is reached where
    /// [`is_end_entire`][DevicePathNode::is_end_entire] is true. That ending
    /// path is not returned by the iterator.
    #[must_use]
    pub fn node_iter(&self) -> DevicePathNodeIterator<'a> {
        DevicePathNodeIterator {
            nodes: RawNodes { data: self.data },
            stop_condition: StopCondition::EndEntireNode,
        }
    }
}

/// Walks nodes without checking them. Only used on validated data.
#[derive(Clone, Debug)]
struct RawNodes<'a> {
    data: &'a [u8],
}

impl<'a> Iterator for RawNodes<'a> {
    type Item = DevicePathNode<'a>;

    fn next(&mut self) -> Option<Self::Item> {
        let header = DevicePathHeader::read(self.data)?;
        let length = usize::from(header.length).clamp(DevicePathHeader::SIZE, self.data.len());
        let (node, rest) = self.data.split_at(length);
        self.data = rest;
        Some(DevicePathNode {
            header,
            data: &node[DevicePathHeader::SIZE..],
        })
    }
}

/// Iterator over the [`DevicePathInstance`]s in a [`DevicePath`].
///
/// This struct is returned by [`DevicePath::instance_iter`].
#[derive(Debug)]
pub struct DevicePathInstanceIterator<'a> {
    remaining_path: &'a [u8],
}

impl<'a> Iterator for DevicePathInstanceIterator<'a> {
    type Item = DevicePathInstance<'a>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.remaining_path.is_empty() {
            return None;
        }

        let mut instance_size = 0;
        for node in (RawNodes {
            data: self.remaining_path,
        }) {
            instance_size += DevicePathHeader::SIZE + node.data.len();
            if node.is_end() {
                break;
            }
        }

        let (instance, rest) = self.remaining_path.split_at(instance_size);
        self.remaining_path = rest;
        Some(DevicePathInstance { data: instance })
    }
}

#[derive(Debug)]
enum StopCondition {
    AnyEndNode,
    EndEntireNode,
}

/// Iterator over [`DevicePathNode`]s.
///
/// This struct is returned by [`DevicePath::node_iter`] and
/// [`DevicePathInstance::node_iter`].
#[derive(Debug)]
pub struct DevicePathNodeIterator<'a> {
    nodes: RawNodes<'a>,
    stop_condition: StopCondition,
}

impl<'a> Iterator for DevicePathNodeIterator<'a> {
    type Item = DevicePathNode<'a>;

    fn next(&mut self) -> Option<Self::Item> {
        let node = self.nodes.next()?;

        let stop = match self.stop_condition {
            StopCondition::AnyEndNode => node.is_end(),
            StopCondition::EndEntireNode => node.is_end_entire(),
        };

        if stop {
            // Leave the iterator in a state where it will always return None.
            self.nodes.data = &[];
            None
        } else {
            Some(node)
        }
    }
}

newtype_enum! {
/// Type identifier for a DevicePath
pub enum DeviceType: u8 => {
    /// Hardware Device Path.
    ///
    /// This Device Path defines how a device is attached to the resource domain of a system, where resource domain is
    /// simply the shared memory, memory mapped I/ O, and I/O space of the system.
    HARDWARE = 0x01,
    /// ACPI Device Path.
    ///
    /// This Device Path is used to describe devices whose enumeration is not described in an industry-standard fashion.
    /// These devices must be described using ACPI AML in the ACPI namespace; this Device Path is a linkage to the ACPI
    /// namespace.
    ACPI = 0x02,
    /// Messaging Device Path.
    ///
    /// This Device Path is used to describe the connection of devices outside the resource domain of the system.
    MESSAGING = 0x03,
    /// Media Device Path.
    ///
    /// This Device Path is used to describe the portion of a medium that is being abstracted by a boot service.
    /// For example, a Media Device Path could define which partition on a hard drive was being used.
    MEDIA = 0x04,
    /// BIOS Boot Specification Device Path.
    BIOS_BOOT_SPEC = 0x05,
    /// End of Hardware Device Path.
    ///
    /// Depending on the Sub-Type, this Device Path node is used to indicate the end of the Device Path instance or
    /// Device Path structure.
    END = 0x7F,
}}

/// Sub-type identifier for a DevicePath
///
/// The meaning of a sub-type depends on the [`DeviceType`] it goes with.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub struct DeviceSubType(pub u8);

impl DeviceSubType {
    /// PCI Device Path.
    pub const HARDWARE_PCI: DeviceSubType = DeviceSubType(1);
    /// PCCARD Device Path.
    pub const HARDWARE_PCCARD: DeviceSubType = DeviceSubType(2);
    /// Memory-mapped Device Path.
    pub const HARDWARE_MEMORY_MAPPED: DeviceSubType = DeviceSubType(3);
    /// Vendor-Defined Device Path.
    pub const HARDWARE_VENDOR: DeviceSubType = DeviceSubType(4);
    /// Controller Device Path.
    pub const HARDWARE_CONTROLLER: DeviceSubType = DeviceSubType(5);
    /// BMC Device Path.
    pub const HARDWARE_BMC: DeviceSubType = DeviceSubType(6);

    /// ACPI Device Path.
    pub const ACPI: DeviceSubType = DeviceSubType(1);
    /// Expanded ACPI Device Path.
    pub const ACPI_EXPANDED: DeviceSubType = DeviceSubType(2);
    /// ACPI _ADR Device Path.
    pub const ACPI_ADR: DeviceSubType = DeviceSubType(3);

    /// ATAPI Device Path.
    pub const MESSAGING_ATAPI: DeviceSubType = DeviceSubType(1);
    /// SCSI Device Path.
    pub const MESSAGING_SCSI: DeviceSubType = DeviceSubType(2);
    /// USB Device Path.
    pub const MESSAGING_USB: DeviceSubType = DeviceSubType(5);
    /// Vendor-Defined Device Path.
    pub const MESSAGING_VENDOR: DeviceSubType = DeviceSubType(10);
    /// MAC Address Device Path.
    pub const MESSAGING_MAC_ADDRESS: DeviceSubType = DeviceSubType(11);
    /// IPV4 Device Path.
    pub const MESSAGING_IPV4: DeviceSubType = DeviceSubType(12);
    /// SATA Device Path.
    pub const MESSAGING_SATA: DeviceSubType = DeviceSubType(18);
    /// NVM Express Namespace Device Path.
    pub const MESSAGING_NVME_NAMESPACE: DeviceSubType = DeviceSubType(23);
    /// Uniform Resource Identifiers (URI) Device Path.
    pub const MESSAGING_URI: DeviceSubType = DeviceSubType(24);

    /// Hard Drive Media Device Path.
    pub const MEDIA_HARD_DRIVE: DeviceSubType = DeviceSubType(1);
    /// CD-ROM Media Device Path.
    pub const MEDIA_CD_ROM: DeviceSubType = DeviceSubType(2);
    /// Vendor-Defined Media Device Path.
    pub const MEDIA_VENDOR: DeviceSubType = DeviceSubType(3);
    /// File Path Media Device Path.
    pub const MEDIA_FILE_PATH: DeviceSubType = DeviceSubType(4);
    /// Media Protocol Device Path.
    pub const MEDIA_PROTOCOL: DeviceSubType = DeviceSubType(5);
    /// PIWG Firmware File.
    pub const MEDIA_PIWG_FIRMWARE_FILE: DeviceSubType = DeviceSubType(6);
    /// PIWG Firmware Volume.
    pub const MEDIA_PIWG_FIRMWARE_VOLUME: DeviceSubType = DeviceSubType(7);
    /// Relative Offset Range.
    pub const MEDIA_RELATIVE_OFFSET_RANGE: DeviceSubType = DeviceSubType(8);

    /// BIOS Boot Specification Device Path.
    pub const BIOS_BOOT_SPECIFICATION: DeviceSubType = DeviceSubType(1);

    /// End this instance of a Device Path and start a new one.
    pub const END_INSTANCE: DeviceSubType = DeviceSubType(0x01);
    /// End entire Device Path.
    pub const END_ENTIRE: DeviceSubType = DeviceSubType(0xff);
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Create a node to `path` from raw data.
    pub(crate) fn add_node(path: &mut Vec<u8>, device_type: u8, sub_type: u8, node_data: &[u8]) {
        path.push(device_type);
        path.push(sub_type);
        path.extend(
            u16::try_from(DevicePathHeader::SIZE + node_data.len())
                .unwrap()
                .to_le_bytes(),
        );
        path.extend(node_data);
    }

    /// Create a test device path list as raw bytes.
    fn create_raw_device_path() -> Vec<u8> {
        let mut raw_data = Vec::new();

        // First path instance.
        add_node(&mut raw_data, 0xa0, 0xb0, &[10, 11]);
        add_node(&mut raw_data, 0xa1, 0xb1, &[20, 21, 22, 23]);
        add_node(
            &mut raw_data,
            DeviceType::END.0,
            DeviceSubType::END_INSTANCE.0,
            &[],
        );
        // Second path instance.
        add_node(&mut raw_data, 0xa2, 0xb2, &[30, 31]);
        add_node(&mut raw_data, 0xa3, 0xb3, &[40, 41, 42, 43]);
        add_node(
            &mut raw_data,
            DeviceType::END.0,
            DeviceSubType::END_ENTIRE.0,
            &[],
        );

        raw_data
    }

    /// Check that `node` has the expected content.
    fn check_node(node: &DevicePathNode, device_type: u8, sub_type: u8, node_data: &[u8]) {
        assert_eq!(node.device_type().0, device_type);
        assert_eq!(node.sub_type().0, sub_type);
        assert_eq!(
            node.length(),
            u16::try_from(DevicePathHeader::SIZE + node_data.len()).unwrap()
        );
        assert_eq!(node.data(), node_data);
    }

    #[test]
    fn test_device_path_nodes() {
        let raw_data = create_raw_device_path();
        let dp = DevicePath::new(&raw_data).unwrap();
        assert_eq!(dp.as_bytes().len(), 6 + 8 + 4 + 6 + 8 + 4);

        let nodes: Vec<_> = dp.node_iter().collect();
        check_node(&nodes[0], 0xa0, 0xb0, &[10, 11]);
        check_node(&nodes[1], 0xa1, 0xb1, &[20, 21, 22, 23]);
        check_node(
            &nodes[2],
            DeviceType::END.0,
            DeviceSubType::END_INSTANCE.0,
            &[],
        );
        check_node(&nodes[3], 0xa2, 0xb2, &[30, 31]);
        check_node(&nodes[4], 0xa3, 0xb3, &[40, 41, 42, 43]);
        // The end-entire node is not returned by the iterator.
        assert_eq!(nodes.len(), 5);
    }

    #[test]
    fn test_device_path_instances() {
        let raw_data = create_raw_device_path();
        let dp = DevicePath::new(&raw_data).unwrap();

        let mut iter = dp.instance_iter();
        let instance = iter.next().unwrap();
        assert_eq!(instance.as_bytes().len(), 6 + 8 + 4);
        let nodes: Vec<_> = instance.node_iter().collect();
        check_node(&nodes[0], 0xa0, 0xb0, &[10, 11]);
        check_node(&nodes[1], 0xa1, 0xb1, &[20, 21, 22, 23]);
        assert_eq!(nodes.len(), 2);

        let instance = iter.next().unwrap();
        assert_eq!(instance.as_bytes().len(), 6 + 8 + 4);
        let nodes: Vec<_> = instance.node_iter().collect();
        check_node(&nodes[0], 0xa2, 0xb2, &[30, 31]);
        check_node(&nodes[1], 0xa3, 0xb3, &[40, 41, 42, 43]);
        assert_eq!(nodes.len(), 2);

        assert!(iter.next().is_none());
    }

    #[test]
    fn test_packed_paths() {
        let mut raw_data = create_raw_device_path();
        add_node(&mut raw_data, 0xa4, 0xb4, &[50]);
        add_node(
            &mut raw_data,
            DeviceType::END.0,
            DeviceSubType::END_ENTIRE.0,
            &[],
        );

        let dp = DevicePath::new(&raw_data).unwrap();
        assert_eq!(dp.node_iter().count(), 5);
        assert_eq!(dp.instance_iter().count(), 3);
    }

    #[test]
    fn test_invalid_paths() {
        assert_eq!(DevicePath::new(&[]), Err(DevicePathError::Empty));
        assert_eq!(
            DevicePath::new(&[0x7f, 0xff]),
            Err(DevicePathError::TruncatedHeader { offset: 0 })
        );
        assert_eq!(
            DevicePath::new(&[0x7f, 0xff, 0x02, 0x00]),
            Err(DevicePathError::InvalidNodeLength {
                offset: 0,
                length: 2
            })
        );

        let mut raw_data = Vec::new();
        add_node(&mut raw_data, 0x04, 0x04, &[b'a', 0, 0, 0]);
        assert_eq!(DevicePath::new(&raw_data), Err(DevicePathError::MissingEnd));

        raw_data[2] = 0x20;
        assert_eq!(
            DevicePath::new(&raw_data),
            Err(DevicePathError::InvalidNodeLength {
                offset: 0,
                length: 0x20
            })
        );
    }
}
