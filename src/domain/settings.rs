use std::path::Path;

use serde::{Deserialize, Serialize};

/// The render settings for a publish run.
///
/// Each toggle changes one aspect of how items are rendered. All of them
/// default to `true`; a settings file or a CLI flag switches them off for a
/// single invocation. Publishing never writes this file back.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "Versions", into = "Versions")]
#[allow(clippy::struct_excessive_bools)]
pub struct Settings {
    /// Whether headings of non-normative items participate in section
    /// numbering.
    ///
    /// When `false`, non-normative items render with the unnumbered (starred)
    /// variant of their heading command.
    pub publish_heading_levels: bool,

    /// Whether headings of normative items participate in section numbering.
    ///
    /// When `false`, normative items render with the unnumbered (starred)
    /// variant of their heading command.
    pub publish_body_levels: bool,

    /// Whether an item's header text appears in its heading.
    ///
    /// When `true`, a normative item with a header renders the header followed
    /// by its identifier in small type. When `false`, the identifier alone is
    /// the heading text.
    pub enable_headers: bool,

    /// Whether the link list is labelled for a publication that also carries
    /// child links.
    ///
    /// When `true`, the list of parent identifiers is labelled `Parent links`;
    /// when `false`, plainly `Links`.
    pub publish_child_links: bool,

    /// Whether external references are verified against the filesystem.
    ///
    /// When `true`, each reference renders its resolved path, with a line
    /// locator where one was found. When `false`, references render their
    /// stored paths verbatim and the filesystem is never consulted.
    pub check_ref: bool,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            publish_heading_levels: true,
            publish_body_levels: true,
            enable_headers: true,
            publish_child_links: true,
            check_ref: true,
        }
    }
}

impl Settings {
    /// Loads the settings from a TOML file at the given path.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or if the TOML content is
    /// invalid.
    pub fn load(path: &Path) -> Result<Self, String> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| format!("Failed to read settings file: {e}"))?;
        toml::from_str(&content).map_err(|e| format!("Failed to parse settings file: {e}"))
    }
}

const fn default_true() -> bool {
    true
}

/// The serialized versions of the settings.
/// This allows the file format and the domain type to evolve independently
/// without breaking existing settings files.
#[derive(Debug, Serialize, Deserialize)]
#[serde(tag = "_version")]
#[allow(clippy::struct_excessive_bools)]
enum Versions {
    #[serde(rename = "1")]
    V1 {
        #[serde(default = "default_true")]
        publish_heading_levels: bool,

        #[serde(default = "default_true")]
        publish_body_levels: bool,

        #[serde(default = "default_true")]
        enable_headers: bool,

        #[serde(default = "default_true")]
        publish_child_links: bool,

        #[serde(default = "default_true")]
        check_ref: bool,
    },
}

impl From<Versions> for Settings {
    fn from(versions: Versions) -> Self {
        match versions {
            Versions::V1 {
                publish_heading_levels,
                publish_body_levels,
                enable_headers,
                publish_child_links,
                check_ref,
            } => Self {
                publish_heading_levels,
                publish_body_levels,
                enable_headers,
                publish_child_links,
                check_ref,
            },
        }
    }
}

impl From<Settings> for Versions {
    fn from(settings: Settings) -> Self {
        Self::V1 {
            publish_heading_levels: settings.publish_heading_levels,
            publish_body_levels: settings.publish_body_levels,
            enable_headers: settings.enable_headers,
            publish_child_links: settings.publish_child_links,
            check_ref: settings.check_ref,
        }
    }
}
