//! Sidecar verification.
//!
//! Checks that a sidecar carries the attributes a raw editor needs before it
//! applies the embedded settings, and reports a few preset values so a user
//! can tell whether the preset made it into the file.

use serde::Serialize;

use super::generator::STRAIGHTEN_ATTRIBUTE;

/// Attribute checks, each satisfied by any of its accepted patterns.
const REQUIRED: &[(&str, &[&str])] = &[
    (
        "xmlns:crs",
        &["xmlns:crs=\"http://ns.adobe.com/camera-raw-settings/1.0/\""],
    ),
    (
        "photoshop:SidecarForExtension",
        &["photoshop:SidecarForExtension=\"ARW\""],
    ),
    ("crs:CameraProfile", &["crs:CameraProfile=\"Adobe Standard\""]),
    ("crs:HasSettings", &["crs:HasSettings=\"True\""]),
    (
        "crs:HasCrop",
        &["crs:HasCrop=\"True\"", "crs:HasCrop=\"False\""],
    ),
    ("crs:AlreadyApplied", &["crs:AlreadyApplied=\"False\""]),
];

/// Preset values reported when present.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct PresetMarkers {
    /// `crs:Temperature`.
    pub temperature: Option<String>,
    /// `crs:Exposure2012`.
    pub exposure: Option<String>,
    /// `crs:Highlights2012`.
    pub highlights: Option<String>,
}

/// Verification outcome for one sidecar.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct SidecarReport {
    /// Required attributes that were not found.
    pub missing: Vec<&'static str>,
    /// Preset values found in the document.
    pub markers: PresetMarkers,
    /// Straighten angle, if the document carries one.
    pub straighten_angle: Option<String>,
}

impl SidecarReport {
    /// Returns true if every required attribute is present.
    #[must_use]
    pub fn passed(&self) -> bool {
        self.missing.is_empty()
    }
}

/// Verifies sidecar `content`.
#[must_use]
pub fn verify(content: &str) -> SidecarReport {
    let missing = REQUIRED
        .iter()
        .filter(|(_, patterns)| !patterns.iter().any(|p| content.contains(p)))
        .map(|(name, _)| *name)
        .collect();

    SidecarReport {
        missing,
        markers: PresetMarkers {
            temperature: attribute_value(content, "crs:Temperature"),
            exposure: attribute_value(content, "crs:Exposure2012"),
            highlights: attribute_value(content, "crs:Highlights2012"),
        },
        straighten_angle: attribute_value(content, STRAIGHTEN_ATTRIBUTE),
    }
}

/// Value of the first `name="..."` occurrence preceded by whitespace.
#[must_use]
pub fn attribute_value(content: &str, name: &str) -> Option<String> {
    let needle = format!("{name}=\"");
    let mut from = 0;
    while let Some(found) = content[from..].find(&needle) {
        let at = from + found;
        let bounded = content[..at]
            .chars()
            .next_back()
            .map_or(true, char::is_whitespace);
        let value_start = at + needle.len();
        if bounded {
            let len = content[value_start..].find('"')?;
            return Some(content[value_start..value_start + len].to_owned());
        }
        from = value_start;
    }
    None
}
