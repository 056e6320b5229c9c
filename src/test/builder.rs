//! Synthetic managed PE images for tests.
//!
//! [`ImageBuilder`] emits a minimal PE32 DLL with a single `.text` section holding the CLR
//! header and the metadata. Rows are declared in table order; owned ranges (`field_list`,
//! `method_list`, `param_list`) follow from declaration order: fields and methods belong to the
//! most recently declared type, params to the most recently declared method.
//!
//! Every width is computed here from scratch, so the images double as an independent check of
//! the library's layout resolution. This file is shared with the integration tests through
//! `#[path]` and must not depend on the library.
//!
//! Image layout:
//!
//! ```text
//! 0x000  DOS header, e_lfanew = 0x80
//! 0x080  PE signature, COFF header, PE32 optional header
//! 0x178  section table (.text)
//! 0x200  .text (RVA 0x2000): CLR header, metadata root, streams
//! ```

#![allow(dead_code)]

const FILE_ALIGNMENT: usize = 0x200;
const SECTION_ALIGNMENT: usize = 0x2000;
const TEXT_RVA: usize = 0x2000;
const PE_OFFSET: usize = 0x80;
const CLR_HEADER_SIZE: usize = 72;
const CLR_DIRECTORY: usize = 14;

const MODULE: u8 = 0x00;
const TYPE_REF: u8 = 0x01;
const TYPE_DEF: u8 = 0x02;
const FIELD_PTR: u8 = 0x03;
const FIELD: u8 = 0x04;
const METHOD_DEF: u8 = 0x06;
const PARAM: u8 = 0x08;
const INTERFACE_IMPL: u8 = 0x09;
const TYPE_SPEC: u8 = 0x1B;
const ASSEMBLY: u8 = 0x20;

const MVID: [u8; 16] = [
    0x4D, 0x6F, 0x64, 0x75, 0x6C, 0x65, 0x56, 0x65, 0x72, 0x73, 0x69, 0x6F, 0x6E, 0x49, 0x64,
    0x01,
];

/// Target of a `TypeDefOrRef` coded index.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TypeTarget {
    TypeDef(u32),
    TypeRef(u32),
    TypeSpec(u32),
}

impl TypeTarget {
    fn encode(self) -> u32 {
        match self {
            TypeTarget::TypeDef(row) => row << 2,
            TypeTarget::TypeRef(row) => row << 2 | 1,
            TypeTarget::TypeSpec(row) => row << 2 | 2,
        }
    }
}

struct TypeDefEntry {
    flags: u32,
    name: u32,
    namespace: u32,
    extends: Option<TypeTarget>,
    field_list: u32,
    method_list: u32,
}

struct MethodEntry {
    flags: u16,
    name: u32,
    signature: u32,
    param_list: u32,
}

/// Builder for a complete managed PE image.
pub struct ImageBuilder {
    strings: Vec<u8>,
    blobs: Vec<u8>,
    guids: Vec<u8>,
    user_strings: Vec<u8>,
    heap_sizes: u8,
    uncompressed: bool,
    clr_header: bool,
    module_name: String,
    assembly_name: Option<String>,
    type_refs: Vec<(u32, u32)>,
    type_defs: Vec<TypeDefEntry>,
    field_ptrs: Vec<u32>,
    fields: Vec<(u16, u32, u32)>,
    methods: Vec<MethodEntry>,
    params: Vec<(u16, u32)>,
    interface_impls: Vec<(u32, TypeTarget)>,
    type_specs: Vec<u32>,
    stream_sizes: Vec<(String, u32)>,
}

impl Default for ImageBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl ImageBuilder {
    /// An image with the `Module` row, the `<Module>` type and an `Assembly` row.
    pub fn new() -> ImageBuilder {
        let mut builder = ImageBuilder {
            strings: vec![0],
            blobs: vec![0],
            guids: Vec::new(),
            user_strings: vec![0],
            heap_sizes: 0,
            uncompressed: false,
            clr_header: true,
            module_name: "sample.dll".to_string(),
            assembly_name: Some("sample".to_string()),
            type_refs: Vec::new(),
            type_defs: Vec::new(),
            field_ptrs: Vec::new(),
            fields: Vec::new(),
            methods: Vec::new(),
            params: Vec::new(),
            interface_impls: Vec::new(),
            type_specs: Vec::new(),
            stream_sizes: Vec::new(),
        };

        builder.guids.extend_from_slice(&MVID);
        builder.type_def(0, "", "<Module>", None);
        builder
    }

    /// Drop the CLR runtime header directory, leaving a native image.
    pub fn without_clr_header(&mut self) -> &mut Self {
        self.clr_header = false;
        self
    }

    /// Omit the `Assembly` table, as in a netmodule.
    pub fn without_assembly(&mut self) -> &mut Self {
        self.assembly_name = None;
        self
    }

    /// Name of the `Assembly` row.
    pub fn assembly_name(&mut self, name: &str) -> &mut Self {
        self.assembly_name = Some(name.to_string());
        self
    }

    /// Name of the `Module` row.
    pub fn module_name(&mut self, name: &str) -> &mut Self {
        self.module_name = name.to_string();
        self
    }

    /// Force 4-byte heap indices for the heaps whose bits are set (0x01, 0x02, 0x04).
    pub fn heap_sizes(&mut self, flags: u8) -> &mut Self {
        self.heap_sizes = flags;
        self
    }

    /// Name the tables stream `#-` instead of `#~`.
    pub fn uncompressed(&mut self) -> &mut Self {
        self.uncompressed = true;
        self
    }

    /// Declare a wrong size for a stream header.
    pub fn override_stream_size(&mut self, name: &str, size: u32) -> &mut Self {
        self.stream_sizes.push((name.to_string(), size));
        self
    }

    /// Add a `TypeRef` scoped to the module; returns its row.
    pub fn type_ref(&mut self, namespace: &str, name: &str) -> u32 {
        let entry = (self.string(name), self.string(namespace));
        self.type_refs.push(entry);
        self.type_refs.len() as u32
    }

    /// Add a `TypeSpec` with a `GENERICINST` style signature; returns its row.
    pub fn type_spec(&mut self) -> u32 {
        let signature = self.blob(&[0x15, 0x12, 0x04, 0x01, 0x08]);
        self.type_specs.push(signature);
        self.type_specs.len() as u32
    }

    /// Add a `TypeDef` owning the fields and methods declared after it; returns its row.
    pub fn type_def(
        &mut self,
        flags: u32,
        namespace: &str,
        name: &str,
        extends: Option<TypeTarget>,
    ) -> u32 {
        let entry = TypeDefEntry {
            flags,
            name: self.string(name),
            namespace: self.string(namespace),
            extends,
            field_list: self.fields.len() as u32 + 1,
            method_list: self.methods.len() as u32 + 1,
        };
        self.type_defs.push(entry);
        self.type_defs.len() as u32
    }

    /// Add a field of type `int32` to the last type; returns its row.
    pub fn field(&mut self, flags: u16, name: &str) -> u32 {
        let entry = (flags, self.string(name), self.blob(&[0x06, 0x08]));
        self.fields.push(entry);
        self.fields.len() as u32
    }

    /// Add a `void ()` method to the last type; returns its row.
    pub fn method(&mut self, flags: u16, name: &str) -> u32 {
        let entry = MethodEntry {
            flags,
            name: self.string(name),
            signature: self.blob(&[0x20, 0x00, 0x01]),
            param_list: self.params.len() as u32 + 1,
        };
        self.methods.push(entry);
        self.methods.len() as u32
    }

    /// Add a parameter to the last method; returns its row.
    pub fn param(&mut self, sequence: u16, name: &str) -> u32 {
        let entry = (sequence, self.string(name));
        self.params.push(entry);
        self.params.len() as u32
    }

    /// Add a `FieldPtr` row pointing at `field`; returns its row.
    pub fn field_ptr(&mut self, field: u32) -> u32 {
        self.field_ptrs.push(field);
        self.field_ptrs.len() as u32
    }

    /// Add an `InterfaceImpl` row; returns its row.
    pub fn interface_impl(&mut self, class: u32, interface: TypeTarget) -> u32 {
        self.interface_impls.push((class, interface));
        self.interface_impls.len() as u32
    }

    /// Add a `#US` entry; returns its offset.
    pub fn user_string(&mut self, value: &str) -> u32 {
        let offset = self.user_strings.len() as u32;
        let units: Vec<u8> = value.encode_utf16().flat_map(u16::to_le_bytes).collect();
        push_compressed(&mut self.user_strings, units.len() as u32 + 1);
        self.user_strings.extend_from_slice(&units);
        self.user_strings.push(0);
        offset
    }

    /// Replace the `field_list` of a `TypeDef`.
    pub fn override_field_list(&mut self, rid: u32, value: u32) -> &mut Self {
        self.type_defs[rid as usize - 1].field_list = value;
        self
    }

    /// Replace the `type_name` offset of a `TypeDef`.
    pub fn override_type_name(&mut self, rid: u32, offset: u32) -> &mut Self {
        self.type_defs[rid as usize - 1].name = offset;
        self
    }

    /// Emit the image.
    pub fn build(&self) -> Vec<u8> {
        let metadata = self.metadata();

        let mut text = Vec::new();
        push_u32(&mut text, CLR_HEADER_SIZE as u32);
        push_u16(&mut text, 2);
        push_u16(&mut text, 5);
        push_u32(&mut text, (TEXT_RVA + CLR_HEADER_SIZE) as u32);
        push_u32(&mut text, metadata.len() as u32);
        // ILONLY
        push_u32(&mut text, 0x0000_0001);
        text.resize(CLR_HEADER_SIZE, 0);
        text.extend_from_slice(&metadata);

        let raw_size = align(text.len(), FILE_ALIGNMENT);
        let mut image = vec![0_u8; FILE_ALIGNMENT + raw_size];
        self.headers(&mut image, text.len(), raw_size);
        image[FILE_ALIGNMENT..FILE_ALIGNMENT + text.len()].copy_from_slice(&text);
        image
    }

    fn headers(&self, image: &mut [u8], text_size: usize, raw_size: usize) {
        let mut header = Vec::new();

        // DOS header
        header.extend_from_slice(b"MZ");
        header.resize(0x3C, 0);
        push_u32(&mut header, PE_OFFSET as u32);
        header.resize(PE_OFFSET, 0);

        // COFF header
        header.extend_from_slice(b"PE\0\0");
        push_u16(&mut header, 0x014C);
        push_u16(&mut header, 1);
        push_u32(&mut header, 0);
        push_u32(&mut header, 0);
        push_u32(&mut header, 0);
        push_u16(&mut header, 0xE0);
        push_u16(&mut header, 0x2102);

        // Optional header, standard fields
        push_u16(&mut header, 0x010B);
        header.push(8);
        header.push(0);
        push_u32(&mut header, raw_size as u32);
        push_u32(&mut header, 0);
        push_u32(&mut header, 0);
        push_u32(&mut header, 0);
        push_u32(&mut header, TEXT_RVA as u32);
        push_u32(&mut header, 0);

        // Optional header, Windows fields
        push_u32(&mut header, 0x0040_0000);
        push_u32(&mut header, SECTION_ALIGNMENT as u32);
        push_u32(&mut header, FILE_ALIGNMENT as u32);
        push_u16(&mut header, 4);
        push_u16(&mut header, 0);
        push_u16(&mut header, 0);
        push_u16(&mut header, 0);
        push_u16(&mut header, 4);
        push_u16(&mut header, 0);
        push_u32(&mut header, 0);
        push_u32(
            &mut header,
            (TEXT_RVA + align(text_size, SECTION_ALIGNMENT)) as u32,
        );
        push_u32(&mut header, FILE_ALIGNMENT as u32);
        push_u32(&mut header, 0);
        push_u16(&mut header, 3);
        push_u16(&mut header, 0x8540);
        push_u32(&mut header, 0x0010_0000);
        push_u32(&mut header, 0x1000);
        push_u32(&mut header, 0x0010_0000);
        push_u32(&mut header, 0x1000);
        push_u32(&mut header, 0);
        push_u32(&mut header, 16);

        // Data directories
        for index in 0..16 {
            if index == CLR_DIRECTORY && self.clr_header {
                push_u32(&mut header, TEXT_RVA as u32);
                push_u32(&mut header, CLR_HEADER_SIZE as u32);
            } else {
                push_u32(&mut header, 0);
                push_u32(&mut header, 0);
            }
        }

        // Section table
        header.extend_from_slice(b".text\0\0\0");
        push_u32(&mut header, text_size as u32);
        push_u32(&mut header, TEXT_RVA as u32);
        push_u32(&mut header, raw_size as u32);
        push_u32(&mut header, FILE_ALIGNMENT as u32);
        push_u32(&mut header, 0);
        push_u32(&mut header, 0);
        push_u16(&mut header, 0);
        push_u16(&mut header, 0);
        push_u32(&mut header, 0x6000_0020);

        image[..header.len()].copy_from_slice(&header);
    }

    fn metadata(&self) -> Vec<u8> {
        let mut strings = self.strings.clone();
        let module_name = intern(&mut strings, &self.module_name);
        let assembly_name = self
            .assembly_name
            .as_deref()
            .map(|name| intern(&mut strings, name));

        let tables = self.tables_stream(&strings, module_name, assembly_name);

        let tables_name = if self.uncompressed { "#-" } else { "#~" };
        let streams: [(&str, Vec<u8>); 5] = [
            (tables_name, tables),
            ("#Strings", strings),
            ("#US", self.user_strings.clone()),
            ("#GUID", self.guids.clone()),
            ("#Blob", self.blobs.clone()),
        ];

        let version = b"v4.0.30319\0\0";
        let mut header_size = 16 + version.len() + 4;
        for (name, _) in &streams {
            header_size += 8 + align(name.len() + 1, 4);
        }

        let mut root = Vec::new();
        push_u32(&mut root, 0x424A_5342);
        push_u16(&mut root, 1);
        push_u16(&mut root, 1);
        push_u32(&mut root, 0);
        push_u32(&mut root, version.len() as u32);
        root.extend_from_slice(version);
        push_u16(&mut root, 0);
        push_u16(&mut root, streams.len() as u16);

        let mut offset = header_size;
        for (name, data) in &streams {
            let size = align(data.len(), 4);
            let declared = self
                .stream_sizes
                .iter()
                .find(|(stream, _)| stream == name)
                .map_or(size as u32, |(_, size)| *size);

            push_u32(&mut root, offset as u32);
            push_u32(&mut root, declared);
            root.extend_from_slice(name.as_bytes());
            root.push(0);
            root.resize(align(root.len(), 4), 0);
            offset += size;
        }

        for (_, data) in &streams {
            root.extend_from_slice(data);
            root.resize(align(root.len(), 4), 0);
        }

        root
    }

    fn tables_stream(&self, strings: &[u8], module_name: u32, assembly_name: Option<u32>) -> Vec<u8> {
        let mut rows = [0_u32; 64];
        rows[MODULE as usize] = 1;
        rows[TYPE_REF as usize] = self.type_refs.len() as u32;
        rows[TYPE_DEF as usize] = self.type_defs.len() as u32;
        rows[FIELD_PTR as usize] = self.field_ptrs.len() as u32;
        rows[FIELD as usize] = self.fields.len() as u32;
        rows[METHOD_DEF as usize] = self.methods.len() as u32;
        rows[PARAM as usize] = self.params.len() as u32;
        rows[INTERFACE_IMPL as usize] = self.interface_impls.len() as u32;
        rows[TYPE_SPEC as usize] = self.type_specs.len() as u32;
        rows[ASSEMBLY as usize] = u32::from(assembly_name.is_some());

        let mut heap_sizes = self.heap_sizes;
        if strings.len() > 0xFFFF {
            heap_sizes |= 0x01;
        }
        if self.guids.len() / 16 > 0xFFFF {
            heap_sizes |= 0x02;
        }
        if self.blobs.len() > 0xFFFF {
            heap_sizes |= 0x04;
        }

        let wide_string = heap_sizes & 0x01 != 0;
        let wide_guid = heap_sizes & 0x02 != 0;
        let wide_blob = heap_sizes & 0x04 != 0;
        let wide = |table: u8| rows[table as usize] > 0xFFFF;
        let wide_coded = |targets: &[u8], tag_bits: u32| {
            targets
                .iter()
                .any(|table| rows[*table as usize] >= 1 << (16 - tag_bits))
        };
        let wide_type_def_or_ref = wide_coded(&[TYPE_DEF, TYPE_REF, TYPE_SPEC], 2);
        let wide_resolution_scope = wide_coded(&[MODULE, TYPE_REF], 2);

        let mut out = Vec::new();
        push_u32(&mut out, 0);
        out.push(2);
        out.push(0);
        out.push(heap_sizes);
        out.push(1);

        let valid = rows
            .iter()
            .enumerate()
            .filter(|(_, count)| **count > 0)
            .fold(0_u64, |valid, (table, _)| valid | 1 << table);
        push_u64(&mut out, valid);
        push_u64(&mut out, 0x0000_1600_3301_FA00);
        for count in rows.iter().filter(|count| **count > 0) {
            push_u32(&mut out, *count);
        }

        // Module
        push_u16(&mut out, 0);
        push_index(&mut out, module_name, wide_string);
        push_index(&mut out, 1, wide_guid);
        push_index(&mut out, 0, wide_guid);
        push_index(&mut out, 0, wide_guid);

        for (name, namespace) in &self.type_refs {
            // ResolutionScope: Module row 1
            push_index(&mut out, 1 << 2, wide_resolution_scope);
            push_index(&mut out, *name, wide_string);
            push_index(&mut out, *namespace, wide_string);
        }

        for type_def in &self.type_defs {
            push_u32(&mut out, type_def.flags);
            push_index(&mut out, type_def.name, wide_string);
            push_index(&mut out, type_def.namespace, wide_string);
            push_index(
                &mut out,
                type_def.extends.map_or(0, TypeTarget::encode),
                wide_type_def_or_ref,
            );
            push_index(&mut out, type_def.field_list, wide(FIELD));
            push_index(&mut out, type_def.method_list, wide(METHOD_DEF));
        }

        for field in &self.field_ptrs {
            push_index(&mut out, *field, wide(FIELD));
        }

        for (flags, name, signature) in &self.fields {
            push_u16(&mut out, *flags);
            push_index(&mut out, *name, wide_string);
            push_index(&mut out, *signature, wide_blob);
        }

        for method in &self.methods {
            push_u32(&mut out, 0);
            push_u16(&mut out, 0);
            push_u16(&mut out, method.flags);
            push_index(&mut out, method.name, wide_string);
            push_index(&mut out, method.signature, wide_blob);
            push_index(&mut out, method.param_list, wide(PARAM));
        }

        for (sequence, name) in &self.params {
            push_u16(&mut out, 0);
            push_u16(&mut out, *sequence);
            push_index(&mut out, *name, wide_string);
        }

        for (class, interface) in &self.interface_impls {
            push_index(&mut out, *class, wide(TYPE_DEF));
            push_index(&mut out, interface.encode(), wide_type_def_or_ref);
        }

        for signature in &self.type_specs {
            push_index(&mut out, *signature, wide_blob);
        }

        if let Some(name) = assembly_name {
            // SHA1, version 1.0.0.0
            push_u32(&mut out, 0x8004);
            push_u16(&mut out, 1);
            push_u16(&mut out, 0);
            push_u16(&mut out, 0);
            push_u16(&mut out, 0);
            push_u32(&mut out, 0);
            push_index(&mut out, 0, wide_blob);
            push_index(&mut out, name, wide_string);
            push_index(&mut out, 0, wide_string);
        }

        out
    }

    fn string(&mut self, value: &str) -> u32 {
        intern(&mut self.strings, value)
    }

    fn blob(&mut self, value: &[u8]) -> u32 {
        let offset = self.blobs.len() as u32;
        push_compressed(&mut self.blobs, value.len() as u32);
        self.blobs.extend_from_slice(value);
        offset
    }
}

fn intern(heap: &mut Vec<u8>, value: &str) -> u32 {
    if value.is_empty() {
        return 0;
    }

    let offset = heap.len() as u32;
    heap.extend_from_slice(value.as_bytes());
    heap.push(0);
    offset
}

fn align(value: usize, alignment: usize) -> usize {
    value.div_ceil(alignment) * alignment
}

fn push_u16(out: &mut Vec<u8>, value: u16) {
    out.extend_from_slice(&value.to_le_bytes());
}

fn push_u32(out: &mut Vec<u8>, value: u32) {
    out.extend_from_slice(&value.to_le_bytes());
}

fn push_u64(out: &mut Vec<u8>, value: u64) {
    out.extend_from_slice(&value.to_le_bytes());
}

fn push_index(out: &mut Vec<u8>, value: u32, wide: bool) {
    if wide {
        push_u32(out, value);
    } else {
        push_u16(out, value as u16);
    }
}

fn push_compressed(out: &mut Vec<u8>, value: u32) {
    if value < 0x80 {
        out.push(value as u8);
    } else if value < 0x4000 {
        out.extend_from_slice(&(value as u16 | 0x8000).to_be_bytes());
    } else {
        out.extend_from_slice(&(value | 0xC000_0000).to_be_bytes());
    }
}
