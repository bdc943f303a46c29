use std::sync::LazyLock;

use regex::Regex;

use crate::plugin::error::UpdateError;

static NAME_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"@name[ \t]+(\S[^\r\n]*)").expect("valid @name regex"));
static VERSION_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"@version[ \t]+(\S[^\r\n]*)").expect("valid @version regex"));
static UPDATE_URL_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"@updateUrl[ \t]+(\S[^\r\n]*)").expect("valid @updateUrl regex")
});

/// The three tags every plugin header must carry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PluginMetadata {
    pub name: String,
    pub version: String,
    pub update_url: String,
}

/// Pull `@name`, `@version` and `@updateUrl` out of plugin text.
///
/// The first occurrence of each tag wins; its value is the rest of the line,
/// trimmed. `file` only labels the error.
pub fn extract(text: &str, file: &str) -> Result<PluginMetadata, UpdateError> {
    Ok(PluginMetadata {
        name: find_tag(&NAME_RE, text, file, "name")?,
        version: find_tag(&VERSION_RE, text, file, "version")?,
        update_url: find_tag(&UPDATE_URL_RE, text, file, "updateUrl")?,
    })
}

fn find_tag(re: &Regex, text: &str, file: &str, tag: &'static str) -> Result<String, UpdateError> {
    re.captures(text)
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str().trim().to_string())
        .ok_or_else(|| UpdateError::MissingMetadata {
            file: file.to_string(),
            tag,
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    const HEADER: &str = "/**\n * @name Better Volume\n * @version 1.4.2\n * @updateUrl https://example.com/BetterVolume.plugin.js\n */\nmodule.exports = class {};\n";

    #[test]
    fn reads_all_three_tags() {
        let meta = extract(HEADER, "BetterVolume.plugin.js").unwrap();
        assert_eq!(
            meta,
            PluginMetadata {
                name: "Better Volume".to_string(),
                version: "1.4.2".to_string(),
                update_url: "https://example.com/BetterVolume.plugin.js".to_string(),
            }
        );
    }

    #[test]
    fn order_and_spacing_do_not_matter() {
        let text = "// @updateUrl   http://host/x.js   \r\n/*\n *  @version\t2.0.0\n *@name   Spaced  Name \n*/";
        let meta = extract(text, "x.js").unwrap();
        assert_eq!(meta.name, "Spaced  Name");
        assert_eq!(meta.version, "2.0.0");
        assert_eq!(meta.update_url, "http://host/x.js");
    }

    #[test]
    fn first_occurrence_wins() {
        let text = "* @name First\n* @name Second\n* @version 1\n* @updateUrl u\n";
        assert_eq!(extract(text, "a.js").unwrap().name, "First");
    }

    #[test]
    fn missing_tag_names_the_file() {
        let text = " * @name Half\n * @version 1.0.0\n";
        let err = extract(text, "half.plugin.js").unwrap_err();

        assert!(matches!(
            &err,
            UpdateError::MissingMetadata { file, tag: "updateUrl" } if file == "half.plugin.js"
        ));
        assert_eq!(err.to_string(), "missing @updateUrl in half.plugin.js");
    }

    #[test]
    fn tag_without_value_counts_as_missing() {
        let text = " * @name\n * @version 1.0.0\n * @updateUrl u\n";
        assert!(matches!(
            extract(text, "a.js"),
            Err(UpdateError::MissingMetadata { tag: "name", .. })
        ));
    }

    #[test]
    fn version_is_not_validated_here() {
        let text = " * @name N\n * @version banana\n * @updateUrl u\n";
        assert_eq!(extract(text, "a.js").unwrap().version, "banana");
    }
}
