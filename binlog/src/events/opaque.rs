/// Fallback post-header/body representation for event types this crate
/// doesn't decode structurally: unrecognized codes, and recognized codes
/// whose payload this crate has no use for beyond passing it through.
/// Mirrors the reference's "redirect many codes onto a shared unknown
/// body" template trick (see DESIGN.md) without needing metaprogramming.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Opaque {
    pub bytes: Vec<u8>,
}

impl Opaque {
    pub fn decode(bytes: &[u8]) -> Self {
        Opaque { bytes: bytes.to_vec() }
    }
}
