// Sun Oct 18 2026 - Alex

use crate::host::LoadedModule;
use crate::memory::{Address, MemoryError, MemoryRange, MemoryReader};
use ahash::AHashMap;
use goblin::elf::{program_header, sym, Elf};
use goblin::mach::load_command::CommandVariant;
use goblin::mach::{Mach, MachO};
use goblin::Object;
use memmap2::Mmap;
use once_cell::sync::OnceCell;
use serde::Serialize;
use std::fs::File;
use std::path::{Path, PathBuf};

const CHAINED_BIND_BIT: u64 = 1 << 63;
const CHAINED_TARGET_MASK: u64 = (1 << 36) - 1;
const CHAINED_HIGH8_SHIFT: u64 = 36;
const CHAINED_BIND_ORDINAL_MASK: u64 = (1 << 24) - 1;

const CHAINED_IMPORT: u32 = 1;
const CHAINED_IMPORT_ADDEND: u32 = 2;
const CHAINED_IMPORT_ADDEND64: u32 = 3;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum ImageFormat {
    MachO,
    Elf,
}

#[derive(Debug, Clone)]
pub struct BinarySegment {
    pub name: String,
    pub vmaddr: u64,
    pub fileoff: u64,
    pub filesize: u64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BinarySection {
    pub segname: String,
    pub sectname: String,
    pub addr: Address,
    pub size: u64,
}

impl BinarySection {
    pub fn new(segname: impl Into<String>, sectname: impl Into<String>, addr: Address, size: u64) -> Self {
        Self {
            segname: segname.into(),
            sectname: sectname.into(),
            addr,
            size,
        }
    }

    pub fn range(&self) -> MemoryRange {
        MemoryRange::from_start_size(self.addr, self.size)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BinarySymbol {
    pub name: String,
    pub address: Address,
    pub is_external: bool,
}

impl BinarySegment {
    /// Virtual range backed by file contents.
    pub fn file_backed_range(&self) -> MemoryRange {
        MemoryRange::from_start_size(Address::new(self.vmaddr), self.filesize)
    }
}

impl BinarySymbol {
    pub fn new(name: impl Into<String>, address: Address) -> Self {
        Self {
            name: name.into(),
            address,
            is_external: true,
        }
    }
}

#[derive(Debug)]
struct ImageLayout {
    format: ImageFormat,
    base: Address,
    segments: Vec<BinarySegment>,
    sections: Vec<BinarySection>,
    exports: Vec<BinarySymbol>,
    /// Symbol names bound to pointer slots, by slot address.
    binds: AHashMap<u64, String>,
    /// Mach-O chained-fixup import table, indexed by bind ordinal.
    chained_imports: Vec<String>,
}

/// A Mach-O or ELF image mapped from disk. Addresses are the image's
/// link-time virtual addresses; the header is parsed on first use.
pub struct MappedImage {
    mmap: Mmap,
    path: PathBuf,
    name: String,
    layout: OnceCell<ImageLayout>,
}

impl MappedImage {
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, MemoryError> {
        let path_buf = path.as_ref().to_path_buf();
        let file = File::open(&path_buf)?;
        let mmap = unsafe { Mmap::map(&file) }?;
        let name = path_buf
            .file_stem()
            .and_then(|s| s.to_str())
            .unwrap_or("<unnamed>")
            .to_string();

        Ok(Self {
            mmap,
            path: path_buf,
            name,
            layout: OnceCell::new(),
        })
    }

    pub fn data(&self) -> &[u8] {
        &self.mmap
    }

    pub fn format(&self) -> Result<ImageFormat, MemoryError> {
        Ok(self.layout()?.format)
    }

    fn layout(&self) -> Result<&ImageLayout, MemoryError> {
        self.layout.get_or_try_init(|| parse_layout(&self.mmap))
    }

    fn virtual_to_file_offset(&self, addr: u64, len: usize) -> Result<usize, MemoryError> {
        file_offset(&self.layout()?.segments, self.mmap.len(), addr, len)
    }
}

/// File offset of `len` bytes at virtual address `addr`. The whole span has
/// to be file-backed by a single segment.
fn file_offset(segments: &[BinarySegment], file_len: usize, addr: u64, len: usize) -> Result<usize, MemoryError> {
    let out_of_bounds = || MemoryError::OutOfBounds(addr);
    let segment = segments
        .iter()
        .find(|seg| seg.file_backed_range().contains_span(Address::new(addr), len as u64))
        .ok_or_else(out_of_bounds)?;
    let offset = segment
        .fileoff
        .checked_add(addr - segment.vmaddr)
        .ok_or_else(out_of_bounds)?;
    let end = offset.checked_add(len as u64).ok_or_else(out_of_bounds)?;
    if end > file_len as u64 {
        return Err(out_of_bounds());
    }
    usize::try_from(offset).map_err(|_| out_of_bounds())
}

impl MemoryReader for MappedImage {
    fn read_bytes(&self, addr: Address, len: usize) -> Result<Vec<u8>, MemoryError> {
        let offset = self.virtual_to_file_offset(addr.as_u64(), len)?;
        Ok(self.mmap[offset..offset + len].to_vec())
    }
}

impl LoadedModule for MappedImage {
    fn name(&self) -> &str {
        &self.name
    }

    fn path(&self) -> &Path {
        &self.path
    }

    fn base(&self) -> Address {
        self.layout().map(|l| l.base).unwrap_or_default()
    }

    fn reader(&self) -> &dyn MemoryReader {
        self
    }

    fn sections(&self) -> Result<Vec<BinarySection>, MemoryError> {
        Ok(self.layout()?.sections.clone())
    }

    fn exported_symbols(&self) -> Result<Vec<BinarySymbol>, MemoryError> {
        Ok(self.layout()?.exports.clone())
    }

    fn resolve_pointer(&self, raw: u64) -> Option<Address> {
        let layout = self.layout().ok()?;
        match layout.format {
            ImageFormat::MachO => decode_chained_pointer(raw, layout.base),
            ImageFormat::Elf => (raw != 0).then(|| Address::new(raw)),
        }
    }

    fn bound_symbol(&self, slot: Address, raw: u64) -> Option<String> {
        let layout = self.layout().ok()?;
        if let Some(name) = layout.binds.get(&slot.as_u64()) {
            return Some(name.clone());
        }
        if layout.format == ImageFormat::MachO && raw & CHAINED_BIND_BIT != 0 {
            let ordinal = (raw & CHAINED_BIND_ORDINAL_MASK) as usize;
            return layout.chained_imports.get(ordinal).cloned();
        }
        None
    }
}

/// Pointer slots in an on-disk Mach-O hold chained-fixup encodings rather
/// than final addresses. Binds target other images and stay unresolved.
pub fn decode_chained_pointer(raw: u64, base: Address) -> Option<Address> {
    if raw == 0 || raw & CHAINED_BIND_BIT != 0 {
        return None;
    }
    if raw >> CHAINED_HIGH8_SHIFT == 0 && raw >= base.as_u64() {
        return Some(Address::new(raw));
    }
    let target = raw & CHAINED_TARGET_MASK;
    let high8 = (raw >> 56) & 0xff;
    let target = if target < base.as_u64() {
        base.as_u64().checked_add(target)?
    } else {
        target
    };
    Some(Address::new(target | (high8 << 56)))
}

fn parse_layout(data: &[u8]) -> Result<ImageLayout, MemoryError> {
    let object = Object::parse(data)
        .map_err(|e| MemoryError::BinaryParseError(format!("Failed to parse image: {}", e)))?;

    match object {
        Object::Mach(Mach::Binary(macho)) => parse_macho(&macho, data),
        Object::Mach(Mach::Fat(_)) => Err(MemoryError::NotSupported(
            "Fat binaries not supported".to_string(),
        )),
        Object::Elf(elf) => Ok(parse_elf(&elf)),
        _ => Err(MemoryError::NotSupported(
            "Only Mach-O and ELF images are supported".to_string(),
        )),
    }
}

fn parse_macho(macho: &MachO, data: &[u8]) -> Result<ImageLayout, MemoryError> {
    let mut segments = Vec::new();
    let mut sections = Vec::new();
    let mut base = None;

    for segment in &macho.segments {
        let segname = segment.name().unwrap_or("").to_string();
        if segname == "__TEXT" {
            base = Some(Address::new(segment.vmaddr));
        }

        let segment_sections = segment
            .sections()
            .map_err(|e| MemoryError::BinaryParseError(format!("Bad section table in {}: {}", segname, e)))?;
        for (section, _data) in segment_sections {
            let sectname = section.name().unwrap_or("").to_string();
            sections.push(BinarySection::new(
                segname.clone(),
                sectname,
                Address::new(section.addr),
                section.size,
            ));
        }

        segments.push(BinarySegment {
            name: segname,
            vmaddr: segment.vmaddr,
            fileoff: segment.fileoff,
            filesize: segment.filesize,
        });
    }

    let base = base.unwrap_or_default();
    let exports = match macho.exports() {
        Ok(export_list) => export_list
            .into_iter()
            .map(|export| BinarySymbol::new(export.name, base + export.offset))
            .collect(),
        Err(e) => {
            log::debug!("Export trie unreadable ({}), falling back to symbol table", e);
            macho
                .symbols()
                .filter_map(|sym| sym.ok())
                .filter(|(_, nlist)| nlist.is_global() && !nlist.is_undefined())
                .map(|(name, nlist)| BinarySymbol::new(name, Address::new(nlist.n_value)))
                .collect()
        }
    };

    let binds = match macho.imports() {
        Ok(imports) => imports
            .into_iter()
            .filter(|import| !import.is_lazy)
            .map(|import| (import.address, import.name.to_string()))
            .collect(),
        Err(e) => {
            log::debug!("Bind opcodes unreadable: {}", e);
            AHashMap::new()
        }
    };

    let chained_imports = macho
        .load_commands
        .iter()
        .find_map(|lc| match &lc.command {
            CommandVariant::DyldChainedFixups(fixups) => Some(chained_import_names(
                data,
                fixups.dataoff as usize,
                fixups.datasize as usize,
            )),
            _ => None,
        })
        .unwrap_or_default();

    Ok(ImageLayout {
        format: ImageFormat::MachO,
        base,
        segments,
        sections,
        exports,
        binds,
        chained_imports,
    })
}

/// Names in the import table of an `LC_DYLD_CHAINED_FIXUPS` payload, in
/// ordinal order. Stops at the first entry that does not fit the payload.
fn chained_import_names(data: &[u8], offset: usize, size: usize) -> Vec<String> {
    let Some(payload) = offset.checked_add(size).and_then(|end| data.get(offset..end)) else {
        return Vec::new();
    };
    let header = |at: usize| read_u32(payload, at);
    let (Some(imports_offset), Some(symbols_offset), Some(count), Some(format)) =
        (header(8), header(12), header(16), header(20))
    else {
        return Vec::new();
    };
    let stride = match format {
        CHAINED_IMPORT => 4,
        CHAINED_IMPORT_ADDEND => 8,
        CHAINED_IMPORT_ADDEND64 => 16,
        other => {
            log::debug!("Unknown chained import format {}", other);
            return Vec::new();
        }
    };

    let mut names = Vec::new();
    for index in 0..count as usize {
        let Some(at) = index.checked_mul(stride).and_then(|o| o.checked_add(imports_offset as usize)) else {
            break;
        };
        let name_offset = if format == CHAINED_IMPORT_ADDEND64 {
            match read_u32(payload, at.saturating_add(4)) {
                Some(value) => value as usize,
                None => break,
            }
        } else {
            match read_u32(payload, at) {
                Some(value) => (value >> 9) as usize,
                None => break,
            }
        };
        let Some(name) = symbols_offset
            .checked_add(name_offset as u32)
            .and_then(|start| read_c_str(payload, start as usize))
        else {
            break;
        };
        names.push(name);
    }
    names
}

fn read_u32(data: &[u8], at: usize) -> Option<u32> {
    let bytes = data.get(at..at.checked_add(4)?)?;
    Some(u32::from_le_bytes(bytes.try_into().ok()?))
}

fn read_c_str(data: &[u8], at: usize) -> Option<String> {
    let tail = data.get(at..)?;
    let len = tail.iter().position(|&b| b == 0)?;
    std::str::from_utf8(&tail[..len]).ok().map(str::to_string)
}

fn parse_elf(elf: &Elf) -> ImageLayout {
    let segments: Vec<BinarySegment> = elf
        .program_headers
        .iter()
        .filter(|ph| ph.p_type == program_header::PT_LOAD)
        .map(|ph| BinarySegment {
            name: "LOAD".to_string(),
            vmaddr: ph.p_vaddr,
            fileoff: ph.p_offset,
            filesize: ph.p_filesz,
        })
        .collect();

    let base = segments.iter().map(|s| s.vmaddr).min().unwrap_or(0);

    let sections = elf
        .section_headers
        .iter()
        .map(|sh| {
            let name = elf.shdr_strtab.get_at(sh.sh_name).unwrap_or("");
            BinarySection::new("", name, Address::new(sh.sh_addr), sh.sh_size)
        })
        .collect();

    let exports = elf
        .dynsyms
        .iter()
        .filter(|s| !s.is_import() && s.st_value != 0)
        .filter(|s| matches!(s.st_bind(), sym::STB_GLOBAL | sym::STB_WEAK))
        .filter_map(|s| {
            let name = elf.dynstrtab.get_at(s.st_name)?;
            Some(BinarySymbol::new(name, Address::new(s.st_value)))
        })
        .collect();

    // GOT-style slots left for the dynamic linker name the symbol they bind to.
    let binds = elf
        .dynrelas
        .iter()
        .chain(elf.dynrels.iter())
        .filter(|reloc| reloc.r_sym != 0)
        .filter_map(|reloc| {
            let symbol = elf.dynsyms.get(reloc.r_sym)?;
            if !symbol.is_import() {
                return None;
            }
            let name = elf.dynstrtab.get_at(symbol.st_name)?;
            Some((reloc.r_offset, name.to_string()))
        })
        .collect();

    ImageLayout {
        format: ImageFormat::Elf,
        base: Address::new(base),
        segments,
        sections,
        exports,
        binds,
        chained_imports: Vec::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_chained_rebase_offset_format() {
        let base = Address::new(0x1_0000_0000);
        let raw = 0x0010_0000_0000_4000u64 & !CHAINED_BIND_BIT;
        let raw = (raw & !CHAINED_TARGET_MASK) | 0x4000;
        assert_eq!(decode_chained_pointer(raw, base), Some(Address::new(0x1_0000_4000)));
    }

    #[test]
    fn test_chained_bind_is_unresolved() {
        let base = Address::new(0x1_0000_0000);
        assert_eq!(decode_chained_pointer(CHAINED_BIND_BIT | 5, base), None);
        assert_eq!(decode_chained_pointer(0, base), None);
    }

    #[test]
    fn test_plain_pointer_passes_through() {
        let base = Address::new(0x1_0000_0000);
        assert_eq!(
            decode_chained_pointer(0x1_0000_8000, base),
            Some(Address::new(0x1_0000_8000))
        );
    }

    fn segment(vmaddr: u64, fileoff: u64, filesize: u64) -> BinarySegment {
        BinarySegment {
            name: "LOAD".to_string(),
            vmaddr,
            fileoff,
            filesize,
        }
    }

    #[test]
    fn test_file_offset_within_segment() {
        let segments = [segment(0x1000, 0x200, 0x100)];
        assert_eq!(file_offset(&segments, 0x400, 0x1010, 8).unwrap(), 0x210);
        assert!(file_offset(&segments, 0x400, 0x10fc, 8).is_err());
        assert!(file_offset(&segments, 0x400, 0xfff, 1).is_err());
        assert!(file_offset(&segments, 0x280, 0x10f0, 8).is_err());
    }

    #[test]
    fn test_file_offset_near_address_space_end() {
        let segments = [segment(u64::MAX - 0x10, 0, 0x100)];
        assert_eq!(file_offset(&segments, 0x100, u64::MAX - 8, 4).unwrap(), 8);
        assert!(file_offset(&segments, 0x100, u64::MAX - 2, 4).is_err());

        let segments = [segment(0x1000, u64::MAX - 2, 0x100)];
        assert!(matches!(
            file_offset(&segments, 0x100, 0x1008, 4),
            Err(MemoryError::OutOfBounds(0x1008))
        ));
    }

    #[test]
    fn test_chained_import_table() {
        // header, two DYLD_CHAINED_IMPORT entries, then the symbol pool
        let mut payload = Vec::new();
        for value in [0u32, 0x20, 0x1c, 0x24, 2, CHAINED_IMPORT, 0] {
            payload.extend_from_slice(&value.to_le_bytes());
        }
        payload.extend_from_slice(&(1u32 << 9 | 1).to_le_bytes());
        payload.extend_from_slice(&(9u32 << 9 | 1).to_le_bytes());
        payload.extend_from_slice(b"\0_$sSHMp\0_$sSQMp\0");

        let mut data = vec![0xaa; 0x10];
        data.extend_from_slice(&payload);
        assert_eq!(chained_import_names(&data, 0x10, payload.len()), ["_$sSHMp", "_$sSQMp"]);
        assert!(chained_import_names(&data, 0x10, 0x8).is_empty());
        assert!(chained_import_names(&data, usize::MAX, 0x8).is_empty());
    }

    #[cfg(target_os = "linux")]
    #[test]
    fn test_maps_running_executable() {
        let path = std::env::current_exe().unwrap();
        let image = MappedImage::load(&path).unwrap();
        assert_eq!(image.format().unwrap(), ImageFormat::Elf);

        let sections = image.sections().unwrap();
        let text = sections.iter().find(|s| s.sectname == ".text").unwrap();
        assert!(text.size >= 16);

        let data = std::fs::read(&path).unwrap();
        let elf = Elf::parse(&data).unwrap();
        let header = elf
            .section_headers
            .iter()
            .find(|sh| elf.shdr_strtab.get_at(sh.sh_name) == Some(".text"))
            .unwrap();
        let offset = header.sh_offset as usize;
        assert_eq!(image.read_bytes(text.addr, 16).unwrap(), &data[offset..offset + 16]);

        let located = crate::metadata::locate_sections(&image).unwrap();
        assert!(located.is_empty());
    }

    #[test]
    fn test_load_rejects_garbage() {
        let dir = std::env::temp_dir().join("swift-introspect-garbage.bin");
        std::fs::write(&dir, b"definitely not an object file").unwrap();
        let image = MappedImage::load(&dir).unwrap();
        assert!(image.sections().is_err());
        assert_eq!(image.name(), "swift-introspect-garbage");
        let _ = std::fs::remove_file(&dir);
    }
}
