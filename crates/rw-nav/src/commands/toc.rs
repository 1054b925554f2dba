//! `rw-nav toc` command implementation.

use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Instant;

use clap::{Args, ValueEnum};
use rw_config::CliSettings;
use rw_toc::{
    FsTocSource, TocError, TocNode, TocPool, TocWarning, flatten, parse_restructures, restructure,
    validate_links,
};

use super::{ConfigArgs, discover_files, discover_tocs};
use crate::error::CliError;
use crate::output::Output;

/// Output format for TOC trees.
#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
pub(crate) enum Format {
    Yaml,
    Json,
}

/// Arguments for the toc command.
#[derive(Args)]
pub(crate) struct TocArgs {
    /// TOC file, relative to the docset root.
    #[arg(required_unless_present = "all")]
    file: Option<String>,

    /// Expand every TOC file under the docset root and report problems.
    #[arg(long, conflicts_with = "file")]
    all: bool,

    #[command(flatten)]
    config: ConfigArgs,

    /// Restructure operations file (overrides config).
    #[arg(long)]
    restructure: Option<PathBuf>,

    /// Skip restructuring even if configured.
    #[arg(long, conflicts_with = "restructure")]
    no_restructure: bool,

    /// Output format.
    #[arg(long, value_enum, default_value_t = Format::Yaml)]
    format: Format,

    /// Print the flattened view instead of the tree.
    #[arg(long)]
    flat: bool,

    /// Report links to files missing from the docset root.
    #[arg(long)]
    check_links: bool,
}

impl TocArgs {
    /// Execute the toc command.
    ///
    /// # Errors
    ///
    /// Returns an error if configuration fails, a TOC cannot be expanded, or
    /// restructuring fails.
    pub(crate) fn execute(self) -> Result<(), CliError> {
        let output = Output::new();
        let config = self.config.load(CliSettings {
            restructure: self.restructure.clone(),
            ..Default::default()
        })?;
        let root = config.toc_resolved.root_dir.as_path();
        let pool = TocPool::new(Arc::new(FsTocSource::new(root)));

        let Some(file) = self.file.as_deref().filter(|_| !self.all) else {
            return expand_all(&pool, root, &output);
        };

        let start = Instant::now();
        let restructure = config
            .toc_resolved
            .restructure
            .as_deref()
            .filter(|_| !self.no_restructure);
        let tree = prepare_tree(&pool, file, restructure)?;
        tracing::info!(
            file,
            nodes = tree.count(),
            elapsed_ms = start.elapsed().as_millis(),
            "TOC processed"
        );

        let mut warnings = pool.warnings();
        if self.check_links {
            let registry: HashSet<String> = discover_files(root)?.into_iter().collect();
            warnings.extend(validate_links(&tree, file, &registry));
        }
        report_warnings(&warnings, &output);

        output.print(&render(&tree, self.format, self.flat)?);
        Ok(())
    }
}

/// Expanded copy of `file`, restructured when `restructure` is given.
fn prepare_tree(
    pool: &TocPool,
    file: &str,
    restructure: Option<&Path>,
) -> Result<TocNode, CliError> {
    let expanded = pool.expand(file)?;
    let mut tree = TocNode::clone(&expanded);
    if let Some(path) = restructure {
        apply_restructure(&mut tree, path)?;
    }
    Ok(tree)
}

fn apply_restructure(tree: &mut TocNode, path: &Path) -> Result<(), CliError> {
    let content = std::fs::read_to_string(path)?;
    let operations =
        parse_restructures(&content, &path.to_string_lossy()).map_err(TocError::from)?;
    restructure(tree, &operations).map_err(TocError::from)?;
    Ok(())
}

fn expand_all(pool: &TocPool, root: &Path, output: &Output) -> Result<(), CliError> {
    let tocs = discover_tocs(root)?;
    let results = pool.expand_all(&tocs);

    let mut failures = 0;
    for (file, result) in &results {
        if let Err(e) = result {
            output.error(&format!("{file}: {e}"));
            failures += 1;
        }
    }
    report_warnings(&pool.warnings(), output);

    if failures > 0 {
        return Err(CliError::Validation(format!(
            "{failures} of {} TOC files failed to expand",
            results.len()
        )));
    }
    output.success(&format!("Expanded {} TOC files", results.len()));
    Ok(())
}

fn report_warnings(warnings: &[TocWarning], output: &Output) {
    for warning in warnings {
        output.warning(&format!("Warning: {warning}"));
    }
}

fn render(tree: &TocNode, format: Format, flat: bool) -> Result<String, CliError> {
    match (format, flat) {
        (Format::Yaml, false) => rw_toc::to_yaml(tree).map_err(serialize_error),
        (Format::Json, false) => rw_toc::to_json(tree).map_err(serialize_error),
        (Format::Yaml, true) => serde_yaml::to_string(&flatten(tree)).map_err(serialize_error),
        (Format::Json, true) => serde_json::to_string_pretty(&flatten(tree)).map_err(serialize_error),
    }
}

fn serialize_error(e: impl std::fmt::Display) -> CliError {
    CliError::Serialize(e.to_string())
}

#[cfg(test)]
mod tests {
    use std::fs;

    use super::*;

    #[test]
    fn test_render_flat_json() {
        let tree = TocNode::default().with_child(TocNode::named("A").with_href("a.md"));
        let json = render(&tree, Format::Json, true).unwrap();
        let parsed: serde_json::Value = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed[0]["name"], "A");
        assert_eq!(parsed[0]["depth"], 0);
    }

    #[test]
    fn test_apply_restructure_from_file() {
        let temp_dir = tempfile::tempdir().unwrap();
        let path = temp_dir.path().join("restructure.yml");
        fs::write(&path, "- actionType: DeleteSelf\n  key: a.md\n").unwrap();

        let mut tree = TocNode::default()
            .with_child(TocNode::named("A").with_href("a.md"))
            .with_child(TocNode::named("B").with_href("b.md"));
        apply_restructure(&mut tree, &path).unwrap();

        assert_eq!(tree.items.len(), 1);
        assert_eq!(tree.items[0].href.as_deref(), Some("b.md"));
    }

    #[test]
    fn test_prepare_tree_leaves_pool_copy_untouched() {
        let temp_dir = tempfile::tempdir().unwrap();
        let root = temp_dir.path();
        fs::create_dir(root.join("guide")).unwrap();
        fs::write(root.join("toc.yml"), "- name: Guide\n  href: guide/\n").unwrap();
        fs::write(
            root.join("guide/toc.yml"),
            "- name: Install\n  href: install.md\n- name: Faq\n  href: faq.md\n",
        )
        .unwrap();
        let restructure = root.join("restructure.yml");
        fs::write(&restructure, "- actionType: DeleteSelf\n  key: guide/faq.md\n").unwrap();

        let pool = TocPool::new(Arc::new(FsTocSource::new(root)));
        let tree = prepare_tree(&pool, "toc.yml", Some(&restructure)).unwrap();

        let guide = &tree.items[0];
        assert_eq!(guide.items.len(), 1);
        assert_eq!(guide.items[0].href.as_deref(), Some("guide/install.md"));
        assert_eq!(pool.get("toc.yml").unwrap().items[0].items.len(), 2);

        let tree = prepare_tree(&pool, "toc.yml", None).unwrap();
        assert_eq!(tree.items[0].items.len(), 2);
    }

    #[test]
    fn test_prepare_tree_missing_file() {
        let temp_dir = tempfile::tempdir().unwrap();
        let pool = TocPool::new(Arc::new(FsTocSource::new(temp_dir.path())));
        let err = prepare_tree(&pool, "toc.yml", None).unwrap_err();
        assert!(matches!(err, CliError::Toc(TocError::NotFound(_))));
    }

    #[test]
    fn test_apply_restructure_usage_error() {
        let temp_dir = tempfile::tempdir().unwrap();
        let path = temp_dir.path().join("restructure.yml");
        fs::write(&path, "- actionType: ReplaceSelf\n  key: a.md\n").unwrap();

        let err = apply_restructure(&mut TocNode::default(), &path).unwrap_err();
        assert!(matches!(err, CliError::Toc(TocError::Restructure(_))));
    }
}
