use anyhow::Result;
use chrono::Local;
use std::path::{Path, PathBuf};
use tracing::info;

use crate::bundle::GeneratedBundle;

/// Write the bundle's three parts plus a generated README into `dir`,
/// returning the written paths. The export collaborator packages this
/// directory for download.
pub async fn write_bundle(bundle: &GeneratedBundle, dir: &Path) -> Result<Vec<PathBuf>> {
    tokio::fs::create_dir_all(dir).await?;

    let mut written = Vec::new();
    for file in bundle.files() {
        let path = dir.join(&file.path);
        tokio::fs::write(&path, &file.content).await?;
        written.push(path);
    }

    let readme_path = dir.join("README.md");
    tokio::fs::write(&readme_path, render_readme(bundle)).await?;
    written.push(readme_path);

    info!("📦 Exported {} files to {}", written.len(), dir.display());
    Ok(written)
}

pub(crate) fn render_readme(bundle: &GeneratedBundle) -> String {
    let file_list = bundle
        .files()
        .iter()
        .map(|f| format!("- {}", f.path))
        .collect::<Vec<_>>()
        .join("\n");

    format!(
        "# Generated Website\n\n\
         This website was generated from a video using AI.\n\n\
         ## Files\n{}\n\n\
         ## Usage\n\
         1. Open index.html in a web browser\n\
         2. Or serve using a local server:\n\
         ```bash\nnpx serve .\n```\n\n\
         Generated on {}\n",
        file_list,
        Local::now().format("%Y-%m-%d %H:%M:%S")
    )
}
