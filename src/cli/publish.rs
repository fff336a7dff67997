use std::path::{Path, PathBuf};

use clap::Parser;
use relish::{Settings, load_tree};
use tracing::instrument;

#[derive(Debug, Parser)]
#[command(about = "Render documents and write publication artifacts")]
#[allow(clippy::struct_excessive_bools)]
pub struct Publish {
    /// Directory to write artifacts into
    #[arg(long, short, value_name = "DIR")]
    output: PathBuf,

    /// Output format, selected by file extension
    #[arg(long, value_name = "FORMAT", default_value = "tex")]
    format: Format,

    /// Never number headings of non-normative items
    #[arg(long)]
    no_heading_levels: bool,

    /// Never number headings of normative items
    #[arg(long)]
    no_body_levels: bool,

    /// Head every item with its identifier, ignoring stored headers
    #[arg(long)]
    no_headers: bool,

    /// Label outgoing links plainly rather than as parent links
    #[arg(long)]
    no_child_links: bool,

    /// Render stored reference paths without resolving them on disk
    #[arg(long)]
    no_ref_check: bool,
}

#[derive(Debug, Clone, Copy, Default, clap::ValueEnum)]
enum Format {
    #[default]
    Tex,
}

impl Format {
    const fn extension(self) -> &'static str {
        match self {
            Self::Tex => "tex",
        }
    }
}

impl Publish {
    #[instrument(level = "debug", skip(self))]
    pub fn run(self, root: PathBuf) -> anyhow::Result<()> {
        let tree = load_tree(&root)?;
        let settings = self.settings(&root);

        let written = relish::publish(
            &tree,
            &settings,
            &root,
            &self.output,
            self.format.extension(),
        )?;

        println!(
            "Published {} files to {}",
            written.len(),
            self.output.display()
        );
        Ok(())
    }

    /// The persisted settings with this invocation's flags applied on top.
    fn settings(&self, root: &Path) -> Settings {
        let path = root.join(".publish").join("config.toml");
        let mut settings = Settings::load(&path).unwrap_or_else(|e| {
            tracing::debug!("Failed to load settings: {e}");
            Settings::default()
        });

        if self.no_heading_levels {
            settings.publish_heading_levels = false;
        }
        if self.no_body_levels {
            settings.publish_body_levels = false;
        }
        if self.no_headers {
            settings.enable_headers = false;
        }
        if self.no_child_links {
            settings.publish_child_links = false;
        }
        if self.no_ref_check {
            settings.check_ref = false;
        }

        settings
    }
}
