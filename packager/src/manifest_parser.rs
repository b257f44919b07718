//! Manifest deserialization from either published form.
//!
//! All newtype validation (version shape, digest encodings) runs while
//! parsing, so a successfully parsed manifest is well formed.

use crate::digest::{DigestError, Md5Digest, Sha512Digest};
use crate::manifest::{PackageKind, PackageManifest};
use crate::version::{InvalidVersion, Version};
use quick_xml::events::{BytesStart, Event};
use quick_xml::reader::Reader;
use std::collections::BTreeMap;

/// Errors arising from manifest parsing.
#[derive(Debug, thiserror::Error)]
pub enum ManifestParseError {
    /// JSON deserialization or field validation failed.
    #[error("manifest parse error: {0}")]
    Json(#[from] serde_json::Error),

    /// The XML document is malformed.
    #[error("manifest XML error: {0}")]
    Xml(#[from] quick_xml::Error),

    /// A required element or attribute is absent.
    #[error("manifest is missing <{0}>")]
    Missing(&'static str),

    /// The version field is not a four-part numeric version.
    #[error(transparent)]
    Version(#[from] InvalidVersion),

    /// A digest field failed validation.
    #[error(transparent)]
    Digest(#[from] DigestError),

    /// The package type is not one this build understands.
    #[error("unsupported package type \"{0}\"")]
    UnsupportedPackageType(String),
}

/// Parse the JSON form of a manifest.
///
/// # Errors
///
/// Returns [`ManifestParseError::Json`] if the JSON is malformed or a field
/// fails validation.
///
/// # Examples
///
/// ```
/// use dh_updater::manifest_parser::parse_json_manifest;
///
/// let json = concat!(
///     r#"{"version":"1.0.0.1","#,
///     r#""sha512":"z4PhNX7vuL3xVChQ1m2AB9Yg5AULVxXcg/SpIdNs6c5H0NE8XYXysP+DGNKHfuwvY7kxvUdBeoGlODJ6+SfaPg==","#,
///     r#""package_type":"zip","urls":[],"#,
///     r#""file_md5":{"app.exe":"d41d8cd98f00b204e9800998ecf8427e"}}"#,
/// );
/// let manifest = parse_json_manifest(json).expect("valid manifest");
/// assert_eq!(manifest.version().as_str(), "1.0.0.1");
/// ```
pub fn parse_json_manifest(json: &str) -> Result<PackageManifest, ManifestParseError> {
    Ok(serde_json::from_str(json)?)
}

/// Element whose text content is currently being read.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum TextField {
    Version,
    Sha512,
    PackageType,
    Url,
}

/// Fields collected while scanning the XML document.
#[derive(Debug, Default)]
struct XmlFields {
    version: Option<String>,
    sha512: Option<String>,
    package_type: Option<String>,
    urls: Vec<String>,
    files: BTreeMap<String, Md5Digest>,
}

impl XmlFields {
    fn set_text(&mut self, field: TextField, text: String) {
        match field {
            TextField::Version => self.version = Some(text),
            TextField::Sha512 => self.sha512 = Some(text),
            TextField::PackageType => self.package_type = Some(text),
            TextField::Url => self.urls.push(text),
        }
    }

    fn add_file(&mut self, element: &BytesStart<'_>) -> Result<(), ManifestParseError> {
        let mut path = None;
        let mut md5 = None;
        for attribute in element.attributes() {
            let attribute = attribute.map_err(quick_xml::Error::from)?;
            let value = attribute.unescape_value()?.into_owned();
            match attribute.key.as_ref() {
                b"path" => path = Some(value),
                b"md5" => md5 = Some(value),
                _ => {}
            }
        }
        let path = path.ok_or(ManifestParseError::Missing("file path"))?;
        let md5 = md5.ok_or(ManifestParseError::Missing("file md5"))?;
        self.files.insert(path, Md5Digest::try_from(md5)?);
        Ok(())
    }

    fn into_manifest(self) -> Result<PackageManifest, ManifestParseError> {
        let version = Version::try_from(self.version.ok_or(ManifestParseError::Missing("version"))?)?;
        let sha512 =
            Sha512Digest::try_from(self.sha512.ok_or(ManifestParseError::Missing("sha512"))?)?;
        let package_type = self
            .package_type
            .ok_or(ManifestParseError::Missing("package_type"))?;
        if package_type != PackageKind::Zip.as_str() {
            return Err(ManifestParseError::UnsupportedPackageType(package_type));
        }
        Ok(PackageManifest::new(version, sha512, self.urls, self.files))
    }
}

fn text_field(name: &[u8]) -> Option<TextField> {
    match name {
        b"version" => Some(TextField::Version),
        b"sha512" => Some(TextField::Sha512),
        b"package_type" => Some(TextField::PackageType),
        b"url" => Some(TextField::Url),
        _ => None,
    }
}

/// Parse the `<update>` XML form of a manifest.
///
/// Entity references in text and attributes are unescaped. Unknown
/// elements are ignored.
///
/// # Errors
///
/// Returns [`ManifestParseError`] if the XML is malformed, a required
/// element is missing, or a field fails validation.
pub fn parse_xml_manifest(xml: &str) -> Result<PackageManifest, ManifestParseError> {
    let mut reader = Reader::from_str(xml);
    reader.config_mut().trim_text(true);

    let mut fields = XmlFields::default();
    let mut current = None;
    loop {
        match reader.read_event()? {
            Event::Start(element) if element.name().as_ref() == b"file" => {
                fields.add_file(&element)?;
            }
            Event::Start(element) => current = text_field(element.name().as_ref()),
            Event::Empty(element) if element.name().as_ref() == b"file" => {
                fields.add_file(&element)?;
            }
            Event::Text(text) => {
                if let Some(field) = current {
                    fields.set_text(field, text.unescape()?.into_owned());
                }
            }
            Event::End(_) => current = None,
            Event::Eof => break,
            _ => {}
        }
    }
    fields.into_manifest()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::digest::{digest_archive, digest_file};
    use crate::serialization::{to_json, to_xml};
    use rstest::{fixture, rstest};

    #[fixture]
    fn manifest() -> PackageManifest {
        let mut files = BTreeMap::new();
        files.insert("app.exe".to_owned(), digest_file(b"binary"));
        files.insert("data/a&b <x>.txt".to_owned(), digest_file(b"data"));
        files.insert("it's \"quoted\".cfg".to_owned(), digest_file(b""));
        PackageManifest::new(
            Version::try_from("2.3.1.7").expect("valid"),
            digest_archive(b"archive"),
            vec![
                "https://github.com/acme/app/releases/download/v2.3.1.7/app.zip".to_owned(),
                "https://mirror.example/get?file=app.zip&v=2".to_owned(),
            ],
            files,
        )
    }

    #[rstest]
    fn json_round_trips(manifest: PackageManifest) {
        let json = to_json(&manifest).expect("serialise");
        assert_eq!(parse_json_manifest(&json).expect("parse"), manifest);
    }

    #[rstest]
    fn xml_round_trips(manifest: PackageManifest) {
        let xml = to_xml(&manifest);
        assert_eq!(parse_xml_manifest(&xml).expect("parse"), manifest);
    }

    #[rstest]
    fn both_forms_decode_to_the_same_manifest(manifest: PackageManifest) {
        let from_json = parse_json_manifest(&to_json(&manifest).expect("json")).expect("parse");
        let from_xml = parse_xml_manifest(&to_xml(&manifest)).expect("parse");
        assert_eq!(from_json, from_xml);
    }

    #[test]
    fn xml_with_no_urls_or_files_parses() {
        let xml = format!(
            "<update><version>1.0.0.0</version><sha512>{}</sha512>\
             <package_type>zip</package_type><urls></urls><file_md5></file_md5></update>",
            digest_archive(b"").as_str()
        );
        let manifest = parse_xml_manifest(&xml).expect("parse");
        assert!(manifest.urls().is_empty());
        assert!(manifest.file_md5().is_empty());
    }

    #[test]
    fn xml_missing_version_is_reported() {
        let xml = "<update><package_type>zip</package_type></update>";
        assert!(matches!(
            parse_xml_manifest(xml),
            Err(ManifestParseError::Missing("version"))
        ));
    }

    #[test]
    fn xml_rejects_other_package_types() {
        let xml = format!(
            "<update><version>1.0.0.0</version><sha512>{}</sha512>\
             <package_type>msi</package_type></update>",
            digest_archive(b"").as_str()
        );
        assert!(matches!(
            parse_xml_manifest(&xml),
            Err(ManifestParseError::UnsupportedPackageType(kind)) if kind == "msi"
        ));
    }

    #[test]
    fn xml_rejects_bad_file_digest() {
        let xml = format!(
            "<update><version>1.0.0.0</version><sha512>{}</sha512>\
             <package_type>zip</package_type>\
             <file_md5><file path=\"a\" md5=\"nothex\" /></file_md5></update>",
            digest_archive(b"").as_str()
        );
        assert!(matches!(
            parse_xml_manifest(&xml),
            Err(ManifestParseError::Digest(_))
        ));
    }

    #[test]
    fn json_rejects_bad_version() {
        let json = format!(
            r#"{{"version":"1.0","sha512":"{}","package_type":"zip","urls":[],"file_md5":{{}}}}"#,
            digest_archive(b"").as_str()
        );
        assert!(parse_json_manifest(&json).is_err());
    }

    #[test]
    fn malformed_xml_is_an_error() {
        assert!(parse_xml_manifest("<update><version>1.0.0.0</sha512></update>").is_err());
    }
}
