//! Validator for host-supplied metadata providers
//!
//! Hosts run these checks (with a set of known-good test ids) to make sure
//! their provider implementations behave as the taxonomy services expect.

use crate::providers::XBlockMetadataProvider;
use crate::{Error, Result};

/// Validate an [`XBlockMetadataProvider`] implementation
///
/// Checks that `get_xblocks` returns one record per requested key with the
/// required fields populated, and that `get_all_xblocks` yields well-formed
/// records. The given `test_keys` must exist on the host.
pub async fn validate_xblock_provider(
    provider: &dyn XBlockMetadataProvider,
    test_keys: &[String],
) -> Result<()> {
    let xblocks = provider.get_xblocks(test_keys).await?;

    if xblocks.len() != test_keys.len() {
        return Err(Error::InvalidInput(format!(
            "provider returned {} xblocks for {} requested keys",
            xblocks.len(),
            test_keys.len()
        )));
    }

    for xblock in &xblocks {
        if xblock.usage_key.is_empty() {
            return Err(Error::InvalidInput(
                "provider returned an xblock with an empty usage_key".to_string(),
            ));
        }
        if xblock.content_type.is_empty() {
            return Err(Error::InvalidInput(format!(
                "xblock [{}] has an empty content_type",
                xblock.usage_key
            )));
        }
    }

    for xblock in provider.get_all_xblocks().await? {
        if xblock.usage_key.is_empty() {
            return Err(Error::InvalidInput(
                "get_all_xblocks returned an xblock with an empty usage_key".to_string(),
            ));
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::providers::XBlockMetadata;
    use async_trait::async_trait;

    struct StaticProvider {
        xblocks: Vec<XBlockMetadata>,
    }

    #[async_trait]
    impl XBlockMetadataProvider for StaticProvider {
        async fn get_xblocks(&self, usage_keys: &[String]) -> Result<Vec<XBlockMetadata>> {
            Ok(self
                .xblocks
                .iter()
                .filter(|x| usage_keys.contains(&x.usage_key))
                .cloned()
                .collect())
        }

        async fn get_all_xblocks(&self) -> Result<Vec<XBlockMetadata>> {
            Ok(self.xblocks.clone())
        }
    }

    fn xblock(usage_key: &str, content_type: &str) -> XBlockMetadata {
        XBlockMetadata {
            usage_key: usage_key.to_string(),
            content_type: content_type.to_string(),
            content: "Some lesson content".to_string(),
        }
    }

    #[tokio::test]
    async fn test_valid_provider_passes() {
        let provider = StaticProvider {
            xblocks: vec![
                xblock("block-v1:org+c+r+type@video+block@a", "video"),
                xblock("block-v1:org+c+r+type@html+block@b", "html"),
            ],
        };
        let keys = vec![
            "block-v1:org+c+r+type@video+block@a".to_string(),
            "block-v1:org+c+r+type@html+block@b".to_string(),
        ];

        assert!(validate_xblock_provider(&provider, &keys).await.is_ok());
    }

    #[tokio::test]
    async fn test_missing_xblock_fails() {
        let provider = StaticProvider {
            xblocks: vec![xblock("block-v1:org+c+r+type@video+block@a", "video")],
        };
        let keys = vec![
            "block-v1:org+c+r+type@video+block@a".to_string(),
            "block-v1:org+c+r+type@html+block@missing".to_string(),
        ];

        let result = validate_xblock_provider(&provider, &keys).await;
        assert!(matches!(result, Err(Error::InvalidInput(_))));
    }

    #[tokio::test]
    async fn test_empty_content_type_fails() {
        let provider = StaticProvider {
            xblocks: vec![xblock("block-v1:org+c+r+type@video+block@a", "")],
        };
        let keys = vec!["block-v1:org+c+r+type@video+block@a".to_string()];

        let result = validate_xblock_provider(&provider, &keys).await;
        assert!(matches!(result, Err(Error::InvalidInput(_))));
    }
}
