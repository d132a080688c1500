use anyhow::Result;
use prost::Message;
use std::fs::File;
use std::io::{Read, Write};
use std::path::Path;

/// A heap dump as produced by the runtime's heap dumper.
///
/// The wire format is protobuf, usually zstd compressed (`.binpb.zst`).
#[derive(Clone, PartialEq, Message)]
pub struct HeapDump {
    #[prost(message, repeated, tag = "1")]
    pub objects: Vec<HeapObject>,
    #[prost(message, repeated, tag = "2")]
    pub roots: Vec<RootEdge>,
    #[prost(message, repeated, tag = "3")]
    pub spaces: Vec<Space>,
}

#[derive(Clone, PartialEq, Message)]
pub struct HeapObject {
    #[prost(uint64, tag = "1")]
    pub start: u64,
    #[prost(uint64, tag = "2")]
    pub klass: u64,
    /// Shallow size in bytes
    #[prost(uint64, tag = "3")]
    pub size: u64,
    #[prost(uint64, optional, tag = "4")]
    pub objarray_length: Option<u64>,
    /// Reference slots in field order. An objref of 0 is an empty slot.
    #[prost(message, repeated, tag = "5")]
    pub edges: Vec<NormalEdge>,
}

#[derive(Clone, PartialEq, Message)]
pub struct NormalEdge {
    #[prost(uint64, tag = "1")]
    pub slot: u64,
    #[prost(uint64, tag = "2")]
    pub objref: u64,
}

#[derive(Clone, PartialEq, Message)]
pub struct RootEdge {
    #[prost(uint64, tag = "1")]
    pub objref: u64,
}

#[derive(Clone, PartialEq, Message)]
pub struct Space {
    #[prost(string, tag = "1")]
    pub name: String,
    #[prost(uint64, tag = "2")]
    pub start: u64,
    #[prost(uint64, tag = "3")]
    pub end: u64,
}

impl HeapDump {
    pub fn from_binpb_zst(p: impl AsRef<Path>) -> Result<HeapDump> {
        let file = File::open(p)?;
        let mut reader = zstd::Decoder::new(file)?;
        let mut buf = vec![];
        reader.read_to_end(&mut buf)?;
        Ok(HeapDump::decode(buf.as_slice())?)
    }

    pub fn from_binpb(p: impl AsRef<Path>) -> Result<HeapDump> {
        let buf = std::fs::read(p)?;
        Ok(HeapDump::decode(buf.as_slice())?)
    }

    /// Loads a heap dump, picking the decoder from the file extension.
    pub fn from_path(p: impl AsRef<Path>) -> Result<HeapDump> {
        let p = p.as_ref();
        if p.extension().map_or(false, |ext| ext == "zst") {
            Self::from_binpb_zst(p)
        } else {
            Self::from_binpb(p)
        }
    }

    pub fn to_binpb_zst(&self, p: impl AsRef<Path>) -> Result<()> {
        let file = File::create(p)?;
        let mut writer = zstd::Encoder::new(file, 0)?;
        writer.write_all(&self.encode_to_vec())?;
        writer.finish()?;
        Ok(())
    }

    pub fn total_object_size(&self) -> u64 {
        self.objects.iter().map(|o| o.size).sum()
    }
}
