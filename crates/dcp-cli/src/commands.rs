//! Subcommand implementations
//!
//! Output goes to the given writer so the commands can run against a buffer.

use crate::config::CliConfig;
use anyhow::Context;
use dcp_model::{ModelDocument, PackagePath, ProductStructure, ReferenceKind};
use dcp_preview::{NullProgress, PreviewOptions, PreviewReport, PreviewResolver};
use dcp_settings::{SettingsCodec, SettingsDocument};
use dcp_status::{DefaultPolicy, TreeStatus};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// Arguments of `dcp preview`
#[derive(Debug, Clone, Default)]
pub struct PreviewArgs {
    /// Model document (YAML or JSON)
    pub model: PathBuf,
    /// Qualified name of the product component to copy
    pub root: String,
    /// Target package
    pub target: Option<PackagePath>,
    /// Search pattern for kind-ids
    pub search: Option<String>,
    /// Replacement for the search pattern
    pub replace: Option<String>,
    /// Version id of the copies
    pub version_id: Option<String>,
    /// Derive the version id from today's date
    pub new_version: bool,
    /// Default policy
    pub policy: Option<DefaultPolicy>,
    /// Settings to restore before previewing
    pub settings: Option<PathBuf>,
    /// Where to save the decisions afterwards
    pub save_settings: Option<PathBuf>,
    /// Configuration file
    pub config: Option<PathBuf>,
    /// Print the report as JSON
    pub json: bool,
}

impl PreviewArgs {
    /// Preview options from `config`, overridden by the flags
    #[must_use]
    pub fn options(&self, config: &CliConfig) -> PreviewOptions {
        let mut options = config.preview.clone();
        if let Some(target) = &self.target {
            options.target_package = target.clone();
        }
        if let Some(search) = &self.search {
            options.search_pattern.clone_from(search);
        }
        if let Some(replace) = &self.replace {
            options.replace_text.clone_from(replace);
        }
        if self.version_id.is_some() {
            options.version_id.clone_from(&self.version_id);
        }
        options
    }
}

/// Arguments of `dcp tree`
#[derive(Debug, Clone, Default)]
pub struct TreeArgs {
    /// Model document (YAML or JSON)
    pub model: PathBuf,
    /// Qualified name of the product component to copy
    pub root: String,
    /// Default policy
    pub policy: Option<DefaultPolicy>,
    /// Settings to restore before printing
    pub settings: Option<PathBuf>,
    /// Configuration file
    pub config: Option<PathBuf>,
}

/// Load the model at `model` and expand the structure of `root`
///
/// # Errors
/// Returns error if the model cannot be loaded, `root` is unknown or the
/// structure cannot be expanded
pub fn load_structure(model: &Path, root: &str) -> anyhow::Result<Arc<ProductStructure>> {
    let document = ModelDocument::load(model)
        .with_context(|| format!("loading model {}", model.display()))?;
    let model = Arc::new(document.to_model()?);
    let root_id = model
        .find_product_cmpt(root)
        .with_context(|| format!("no product component named '{root}'"))?;
    let structure = ProductStructure::expand(model, root_id)?;
    Ok(Arc::new(structure))
}

/// Run `dcp preview`, returns whether validation found errors
///
/// # Errors
/// Returns error if an input cannot be loaded or the output cannot be written
pub fn preview(args: &PreviewArgs, out: &mut dyn Write) -> anyhow::Result<bool> {
    let config = CliConfig::load_or_default(args.config.as_deref())?;
    let structure = load_structure(&args.model, &args.root)?;
    let naming = config.naming.build();
    let codec = SettingsCodec::new(naming.as_ref());

    let mut status = TreeStatus::new(structure, args.policy.unwrap_or(config.policy));
    if let Some(path) = &args.settings {
        restore(&codec, path, &mut status)?;
    }

    let mut options = args.options(&config);
    if args.new_version && options.version_id.is_none() {
        let today = chrono::Local::now().date_naive();
        let next = naming.next_version_id(status.structure().root_object(), today);
        tracing::info!(version_id = %next, "using version id of today");
        options.version_id = Some(next);
    }

    let mut resolver = PreviewResolver::new(&status, naming.as_ref(), options);
    resolver.validate(&NullProgress);
    let report = PreviewReport::from_resolver(&status, &resolver);

    if args.json {
        serde_json::to_writer_pretty(&mut *out, &report)?;
        writeln!(out)?;
    } else {
        write_report(&report, out)?;
    }

    if let Some(path) = &args.save_settings {
        SettingsDocument::capture(&codec, &status)
            .save(path)
            .with_context(|| format!("saving settings {}", path.display()))?;
    }

    Ok(report.has_errors())
}

/// Run `dcp tree`
///
/// # Errors
/// Returns error if an input cannot be loaded or the output cannot be written
pub fn tree(args: &TreeArgs, out: &mut dyn Write) -> anyhow::Result<()> {
    let config = CliConfig::load_or_default(args.config.as_deref())?;
    let structure = load_structure(&args.model, &args.root)?;
    let naming = config.naming.build();

    let mut status = TreeStatus::new(structure, args.policy.unwrap_or(config.policy));
    if let Some(path) = &args.settings {
        restore(&SettingsCodec::new(naming.as_ref()), path, &mut status)?;
    }

    for reference in status.structure().references() {
        let indent = "  ".repeat(reference.ancestors().count());
        if reference.kind() == ReferenceKind::AssociationGroup {
            writeln!(out, "{indent}{reference}")?;
            continue;
        }
        let id = reference.id();
        writeln!(
            out,
            "{indent}{reference}  {} {} {}",
            if status.is_checked(id) { "checked" } else { "unchecked" },
            if status.is_enabled(id) { "enabled" } else { "disabled" },
            status.copy_or_link(id),
        )?;
    }
    Ok(())
}

fn restore(codec: &SettingsCodec<'_>, path: &Path, status: &mut TreeStatus) -> anyhow::Result<()> {
    let document = SettingsDocument::load(path)
        .with_context(|| format!("loading settings {}", path.display()))?;
    let report = codec.restore(&document.entries, status)?;
    if !report.is_complete() {
        tracing::warn!(
            unresolved = report.unresolved.len(),
            path = %path.display(),
            "some settings did not match the structure"
        );
    }
    Ok(())
}

fn write_report(report: &PreviewReport, out: &mut dyn Write) -> std::io::Result<()> {
    for entry in &report.entries {
        match &entry.target {
            Some(target) => writeln!(out, "{} -> {target}", entry.source)?,
            None => writeln!(out, "{}", entry.source)?,
        }
        for issue in &entry.issues {
            writeln!(out, "  {}: {issue}", issue.severity)?;
        }
    }
    if report.has_errors() {
        writeln!(out, "preview has errors")?;
    }
    Ok(())
}
