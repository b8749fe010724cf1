//! Sidecar (XMP) generation and verification.

mod generator;
mod verify;

pub use generator::{
    generate, InjectionStrategy, SidecarDocument, SidecarGenerator, ANCHOR_ATTRIBUTE,
    BUILTIN_TEMPLATE, HAS_CROP_ATTRIBUTE, MIN_STRAIGHTEN_ANGLE, STRAIGHTEN_ATTRIBUTE,
};
pub use verify::{attribute_value, verify, PresetMarkers, SidecarReport};
