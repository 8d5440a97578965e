//! Primitive types.

use fxhash::FxHashMap;

/// The primitive types that may appear in a WIT signature.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub enum Prim {
    U8,
    U16,
    U32,
    U64,
    S8,
    S16,
    S32,
    S64,
    Float32,
    Float64,
}

impl Prim {
    pub const ALL: [Prim; 10] = [
        Prim::U8,
        Prim::U16,
        Prim::U32,
        Prim::U64,
        Prim::S8,
        Prim::S16,
        Prim::S32,
        Prim::S64,
        Prim::Float32,
        Prim::Float64,
    ];

    /// The name of the type in WIT source.
    pub const fn name(self) -> &'static str {
        match self {
            Prim::U8 => "u8",
            Prim::U16 => "u16",
            Prim::U32 => "u32",
            Prim::U64 => "u64",
            Prim::S8 => "s8",
            Prim::S16 => "s16",
            Prim::S32 => "s32",
            Prim::S64 => "s64",
            Prim::Float32 => "float32",
            Prim::Float64 => "float64",
        }
    }

    /// The name of the corresponding Go type.
    pub const fn go_name(self) -> &'static str {
        match self {
            Prim::U8 => "uint8",
            Prim::U16 => "uint16",
            Prim::U32 => "uint32",
            Prim::U64 => "uint64",
            Prim::S8 => "int8",
            Prim::S16 => "int16",
            Prim::S32 => "int32",
            Prim::S64 => "int64",
            Prim::Float32 => "float32",
            Prim::Float64 => "float64",
        }
    }
}

/// Lookup table from WIT type names to primitives.
pub struct PrimEnv {
    prims: FxHashMap<&'static str, Prim>,
}

impl PrimEnv {
    pub fn new() -> PrimEnv {
        PrimEnv {
            prims: Prim::ALL.iter().map(|prim| (prim.name(), *prim)).collect(),
        }
    }

    pub fn get(&self, name: &str) -> Option<Prim> {
        self.prims.get(name).copied()
    }

    /// The closest primitive to a misspelt type name, if one is near enough.
    pub fn suggest(&self, name: &str) -> Option<Prim> {
        const MAX_DISTANCE: usize = 2;

        Prim::ALL
            .iter()
            .map(|prim| (levenshtein::levenshtein(name, prim.name()), *prim))
            .filter(|(distance, _)| *distance <= MAX_DISTANCE)
            .min_by_key(|(distance, _)| *distance)
            .map(|(_, prim)| prim)
    }
}

impl Default for PrimEnv {
    fn default() -> PrimEnv {
        PrimEnv::new()
    }
}
