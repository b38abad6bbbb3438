// SPDX-License-Identifier: MIT OR Apache-2.0

//! Text representation of device paths.
//!
//! Nodes are rendered with the textual device-path grammar used by UEFI
//! firmware and tools, for example `PciRoot(0x0)/Pci(0x1d,0x0)` or
//! `HD(1,GPT,41c147b6-e9bf-4c27-81c6-174026e79fd0,0x800,0x3a9800)/File(\vmlinuz)`.
//! Nodes within an instance are separated by `/` and instances by `,`.
//!
//! Nodes this module has no specific form for, and nodes whose payload does
//! not have the size their type requires, are rendered in the generic
//! `Path(type,subtype,data)` form (or its per-type variants such as
//! `MediaPath(subtype,data)`), with the payload in hex. The conversion is
//! deterministic, so two equal byte strings always give the same text.

use super::{
    DevicePath, DevicePathError, DevicePathInstance, DevicePathNode, DeviceSubType, DeviceType,
};
use crate::string::read_cstr16;
use core::fmt::{self, Write};
use uguid::Guid;

/// Convert a device path in its binary encoding to text.
///
/// Fails if the bytes are not a structurally valid device path.
pub fn to_text(bytes: &[u8]) -> Result<String, DevicePathError> {
    Ok(DevicePath::new(bytes)?.to_string())
}

impl fmt::Display for DevicePath<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, instance) in self.instance_iter().enumerate() {
            if i > 0 {
                f.write_char(',')?;
            }
            fmt::Display::fmt(&instance, f)?;
        }
        Ok(())
    }
}

impl fmt::Display for DevicePathInstance<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, node) in self.node_iter().enumerate() {
            if i > 0 {
                f.write_char('/')?;
            }
            fmt::Display::fmt(&node, f)?;
        }
        Ok(())
    }
}

impl fmt::Display for DevicePathNode<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match node_text(self) {
            Some(text) => f.write_str(&text),
            None => write_generic(self, f),
        }
    }
}

/// Little-endian reader over node data.
struct Reader<'a>(&'a [u8]);

impl<'a> Reader<'a> {
    fn bytes(&mut self, n: usize) -> Option<&'a [u8]> {
        if self.0.len() < n {
            return None;
        }
        let (bytes, rest) = self.0.split_at(n);
        self.0 = rest;
        Some(bytes)
    }

    fn array<const N: usize>(&mut self) -> Option<[u8; N]> {
        self.bytes(N)?.try_into().ok()
    }

    fn u8(&mut self) -> Option<u8> {
        self.array().map(|[b]: [u8; 1]| b)
    }

    fn u16(&mut self) -> Option<u16> {
        self.array().map(u16::from_le_bytes)
    }

    fn u32(&mut self) -> Option<u32> {
        self.array().map(u32::from_le_bytes)
    }

    fn u64(&mut self) -> Option<u64> {
        self.array().map(u64::from_le_bytes)
    }

    fn guid(&mut self) -> Option<Guid> {
        self.array().map(Guid::from_bytes)
    }

    fn rest(&mut self) -> &'a [u8] {
        core::mem::take(&mut self.0)
    }

    fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

fn hex(bytes: &[u8]) -> String {
    let mut s = String::with_capacity(bytes.len() * 2);
    for b in bytes {
        let _ = write!(s, "{b:02x}");
    }
    s
}

/// Decode a compressed EISA id such as `PNP0A03`. Ids that do not use the
/// compressed form are shown as a number.
fn eisa_id(id: u32) -> String {
    let vendor = id & 0xffff;
    let letters = [(vendor >> 10) & 0x1f, (vendor >> 5) & 0x1f, vendor & 0x1f];
    if vendor >> 15 != 0 || letters.iter().any(|&l| !(1..=26).contains(&l)) {
        return format!("{id:#x}");
    }

    let mut s: String = letters
        .iter()
        .map(|&l| char::from(b'A' - 1 + l as u8))
        .collect();
    let _ = write!(s, "{:04X}", id >> 16);
    s
}

/// Split NUL-terminated ASCII strings. Every string must be terminated.
fn ascii_strings(bytes: &[u8]) -> Option<Vec<&str>> {
    let bytes = bytes.strip_suffix(&[0])?;
    bytes
        .split(|&b| b == 0)
        .map(|s| {
            if s.iter().all(|b| b.is_ascii_graphic() || *b == b' ') {
                core::str::from_utf8(s).ok()
            } else {
                None
            }
        })
        .collect()
}

fn vendor(name: &str, r: &mut Reader) -> Option<String> {
    let guid = r.guid()?;
    let data = r.rest();
    Some(if data.is_empty() {
        format!("{name}({guid})")
    } else {
        format!("{name}({guid},{})", hex(data))
    })
}

fn ipv4(addr: [u8; 4]) -> String {
    let [a, b, c, d] = addr;
    format!("{a}.{b}.{c}.{d}")
}

/// Text of a node in its type-specific form, or `None` if there is no such
/// form or the data does not fit it.
fn node_text(node: &DevicePathNode) -> Option<String> {
    let mut r = Reader(node.data());

    let text = match node.full_type() {
        (DeviceType::HARDWARE, DeviceSubType::HARDWARE_PCI) => {
            let function = r.u8()?;
            let device = r.u8()?;
            format!("Pci({device:#x},{function:#x})")
        }
        (DeviceType::HARDWARE, DeviceSubType::HARDWARE_PCCARD) => {
            format!("PcCard({:#x})", r.u8()?)
        }
        (DeviceType::HARDWARE, DeviceSubType::HARDWARE_MEMORY_MAPPED) => {
            let memory_type = r.u32()?;
            let start = r.u64()?;
            let end = r.u64()?;
            format!("MemoryMapped({memory_type:#x},{start:#x},{end:#x})")
        }
        (DeviceType::HARDWARE, DeviceSubType::HARDWARE_VENDOR) => vendor("VenHw", &mut r)?,
        (DeviceType::HARDWARE, DeviceSubType::HARDWARE_CONTROLLER) => {
            format!("Ctrl({:#x})", r.u32()?)
        }
        (DeviceType::HARDWARE, DeviceSubType::HARDWARE_BMC) => {
            let interface_type = r.u8()?;
            let base_address = r.u64()?;
            format!("BMC({interface_type:#x},{base_address:#x})")
        }

        (DeviceType::ACPI, DeviceSubType::ACPI) => {
            let hid = r.u32()?;
            let uid = r.u32()?;
            match hid {
                0x0a03_41d0 => format!("PciRoot({uid:#x})"),
                0x0a08_41d0 => format!("PcieRoot({uid:#x})"),
                _ => format!("Acpi({},{uid:#x})", eisa_id(hid)),
            }
        }
        (DeviceType::ACPI, DeviceSubType::ACPI_EXPANDED) => {
            let hid = r.u32()?;
            let uid = r.u32()?;
            let cid = r.u32()?;
            let strings = ascii_strings(r.rest())?;
            let [hid_str, uid_str, cid_str] = strings[..] else {
                return None;
            };
            format!(
                "AcpiEx({},{},{uid:#x},{hid_str},{cid_str},{uid_str})",
                eisa_id(hid),
                eisa_id(cid)
            )
        }
        (DeviceType::ACPI, DeviceSubType::ACPI_ADR) => {
            let data = r.rest();
            if data.is_empty() || data.len() % 4 != 0 {
                return None;
            }
            let adrs: Vec<String> = data
                .chunks_exact(4)
                .map(|c| format!("{:#x}", u32::from_le_bytes([c[0], c[1], c[2], c[3]])))
                .collect();
            format!("AcpiAdr({})", adrs.join(","))
        }

        (DeviceType::MESSAGING, DeviceSubType::MESSAGING_ATAPI) => {
            let channel = if r.u8()? == 0 { "Primary" } else { "Secondary" };
            let drive = if r.u8()? == 0 { "Master" } else { "Slave" };
            let lun = r.u16()?;
            format!("Ata({channel},{drive},{lun:#x})")
        }
        (DeviceType::MESSAGING, DeviceSubType::MESSAGING_SCSI) => {
            let target = r.u16()?;
            let lun = r.u16()?;
            format!("Scsi({target:#x},{lun:#x})")
        }
        (DeviceType::MESSAGING, DeviceSubType::MESSAGING_USB) => {
            let port = r.u8()?;
            let interface = r.u8()?;
            format!("USB({port:#x},{interface:#x})")
        }
        (DeviceType::MESSAGING, DeviceSubType::MESSAGING_VENDOR) => vendor("VenMsg", &mut r)?,
        (DeviceType::MESSAGING, DeviceSubType::MESSAGING_MAC_ADDRESS) => {
            let address = r.bytes(32)?;
            let interface_type = r.u8()?;
            // Ethernet and experimental ethernet use 6-byte addresses.
            let size = if interface_type <= 1 { 6 } else { 32 };
            format!("MAC({},{interface_type:#x})", hex(&address[..size]))
        }
        (DeviceType::MESSAGING, DeviceSubType::MESSAGING_IPV4) => {
            let local = r.array()?;
            let remote = r.array()?;
            let _local_port = r.u16()?;
            let _remote_port = r.u16()?;
            let protocol = match r.u16()? {
                6 => "TCP".to_owned(),
                17 => "UDP".to_owned(),
                other => other.to_string(),
            };
            let origin = if r.u8()? == 0 { "DHCP" } else { "Static" };
            let gateway = r.array()?;
            let mask = r.array()?;
            format!(
                "IPv4({},{protocol},{origin},{},{},{})",
                ipv4(remote),
                ipv4(local),
                ipv4(gateway),
                ipv4(mask)
            )
        }
        (DeviceType::MESSAGING, DeviceSubType::MESSAGING_SATA) => {
            let hba_port = r.u16()?;
            let multiplier_port = r.u16()?;
            let lun = r.u16()?;
            format!("Sata({hba_port:#x},{multiplier_port:#x},{lun:#x})")
        }
        (DeviceType::MESSAGING, DeviceSubType::MESSAGING_NVME_NAMESPACE) => {
            let namespace_id = r.u32()?;
            let eui: Vec<String> = r.bytes(8)?.iter().map(|b| format!("{b:02X}")).collect();
            format!("NVMe({namespace_id:#x},{})", eui.join("-"))
        }
        (DeviceType::MESSAGING, DeviceSubType::MESSAGING_URI) => {
            format!("Uri({})", core::str::from_utf8(r.rest()).ok()?)
        }

        (DeviceType::MEDIA, DeviceSubType::MEDIA_HARD_DRIVE) => {
            let partition_number = r.u32()?;
            let start = r.u64()?;
            let size = r.u64()?;
            let signature: [u8; 16] = r.array()?;
            let format = match r.u8()? {
                1 => "MBR".to_owned(),
                2 => "GPT".to_owned(),
                other => other.to_string(),
            };
            let signature = match r.u8()? {
                0 => "0".to_owned(),
                1 => format!(
                    "{:#010x}",
                    u32::from_le_bytes([signature[0], signature[1], signature[2], signature[3]])
                ),
                2 => Guid::from_bytes(signature).to_string(),
                _ => hex(&signature),
            };
            format!("HD({partition_number},{format},{signature},{start:#x},{size:#x})")
        }
        (DeviceType::MEDIA, DeviceSubType::MEDIA_CD_ROM) => {
            let boot_entry = r.u32()?;
            let start = r.u64()?;
            let size = r.u64()?;
            format!("CDROM({boot_entry:#x},{start:#x},{size:#x})")
        }
        (DeviceType::MEDIA, DeviceSubType::MEDIA_VENDOR) => vendor("VenMedia", &mut r)?,
        (DeviceType::MEDIA, DeviceSubType::MEDIA_FILE_PATH) => {
            let data = r.rest();
            let (path, size) = read_cstr16(data).ok()?;
            if size != data.len() {
                return None;
            }
            format!("File({path})")
        }
        (DeviceType::MEDIA, DeviceSubType::MEDIA_PROTOCOL) => format!("Media({})", r.guid()?),
        (DeviceType::MEDIA, DeviceSubType::MEDIA_PIWG_FIRMWARE_FILE) => {
            format!("FvFile({})", r.guid()?)
        }
        (DeviceType::MEDIA, DeviceSubType::MEDIA_PIWG_FIRMWARE_VOLUME) => {
            format!("Fv({})", r.guid()?)
        }
        (DeviceType::MEDIA, DeviceSubType::MEDIA_RELATIVE_OFFSET_RANGE) => {
            let _reserved = r.u32()?;
            let start = r.u64()?;
            let end = r.u64()?;
            format!("Offset({start:#x},{end:#x})")
        }

        (DeviceType::BIOS_BOOT_SPEC, DeviceSubType::BIOS_BOOT_SPECIFICATION) => {
            let device_type = r.u16()?;
            let status = r.u16()?;
            let strings = ascii_strings(r.rest())?;
            let [description] = strings[..] else {
                return None;
            };
            format!("BBS({device_type:#x},{description},{status:#x})")
        }

        _ => return None,
    };

    // Trailing bytes mean the node does not have the layout assumed above.
    r.is_empty().then_some(text)
}

fn write_generic(node: &DevicePathNode, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    let prefix = match node.device_type() {
        DeviceType::HARDWARE => "HardwarePath",
        DeviceType::ACPI => "AcpiPath",
        DeviceType::MESSAGING => "Msg",
        DeviceType::MEDIA => "MediaPath",
        DeviceType::BIOS_BOOT_SPEC => "BbsPath",
        DeviceType(other) => return write_path(f, Some(other), node),
    };
    f.write_str(prefix)?;
    write_path(f, None, node)
}

fn write_path(
    f: &mut fmt::Formatter<'_>,
    device_type: Option<u8>,
    node: &DevicePathNode,
) -> fmt::Result {
    match device_type {
        Some(device_type) => write!(f, "Path({device_type},{}", node.sub_type().0)?,
        None => write!(f, "({}", node.sub_type().0)?,
    }
    if !node.data().is_empty() {
        write!(f, ",{}", hex(node.data()))?;
    }
    f.write_char(')')
}
