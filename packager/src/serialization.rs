//! JSON and XML renderings of a [`PackageManifest`].
//!
//! Both forms carry the same fields. The XML form is written by hand to
//! keep the exact layout older update clients parse:
//!
//! ```xml
//! <update>
//!   <version>2.3.1.7</version>
//!   <sha512>...</sha512>
//!   <package_type>zip</package_type>
//!   <urls>
//!     <url>...</url>
//!   </urls>
//!   <file_md5>
//!     <file path="app.exe" md5="..." />
//!   </file_md5>
//! </update>
//! ```

use crate::error::Result;
use crate::manifest::PackageManifest;
use std::borrow::Cow;

/// Serialize `manifest` as pretty-printed JSON.
///
/// # Errors
///
/// Returns [`crate::error::PipelineError::Serialization`] if serialization
/// fails.
pub fn to_json(manifest: &PackageManifest) -> Result<String> {
    Ok(serde_json::to_string_pretty(manifest)?)
}

/// Serialize `manifest` as the `<update>` XML document.
///
/// Text and attribute content is escaped with [`escape_markup`]. The
/// document ends with a newline.
#[must_use]
pub fn to_xml(manifest: &PackageManifest) -> String {
    let mut lines = vec![
        "<update>".to_owned(),
        format!(
            "  <version>{}</version>",
            escape_markup(manifest.version().as_str())
        ),
        format!(
            "  <sha512>{}</sha512>",
            escape_markup(manifest.sha512().as_str())
        ),
        format!(
            "  <package_type>{}</package_type>",
            manifest.package_type()
        ),
        "  <urls>".to_owned(),
    ];
    lines.extend(
        manifest
            .urls()
            .iter()
            .map(|url| format!("    <url>{}</url>", escape_markup(url))),
    );
    lines.push("  </urls>".to_owned());
    lines.push("  <file_md5>".to_owned());
    lines.extend(manifest.file_md5().iter().map(|(path, md5)| {
        format!(
            "    <file path=\"{}\" md5=\"{}\" />",
            escape_markup(path),
            escape_markup(md5.as_str())
        )
    }));
    lines.push("  </file_md5>".to_owned());
    lines.push("</update>".to_owned());

    let mut xml = lines.join("\n");
    xml.push('\n');
    xml
}

/// Escape `& < > " '` for use in XML text or attribute values.
///
/// # Examples
///
/// ```
/// use dh_updater::serialization::escape_markup;
///
/// assert_eq!(escape_markup("a<b & 'c'"), "a&lt;b &amp; &apos;c&apos;");
/// assert_eq!(escape_markup("plain"), "plain");
/// ```
#[must_use]
pub fn escape_markup(raw: &str) -> Cow<'_, str> {
    if !raw.contains(['&', '<', '>', '"', '\'']) {
        return Cow::Borrowed(raw);
    }
    let mut escaped = String::with_capacity(raw.len() + 16);
    for c in raw.chars() {
        match c {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&apos;"),
            other => escaped.push(other),
        }
    }
    Cow::Owned(escaped)
}

#[cfg(test)]
#[path = "serialization_tests.rs"]
mod tests;
