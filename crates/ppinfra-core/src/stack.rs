//! 静的サイトスタックの宣言
//!
//! S3バケット（ウェブサイト設定・所有権・パブリックアクセス）、ローカル
//! フォルダ同期、CloudFrontディストリビューションと4つの出力を
//! [`ResourceGraph`] として組み立てる。外部I/Oは一切行わない純粋関数。

use crate::model::SiteConfig;
use ppinfra_cloud::{OutputSpec, PropertyValue, ProviderBinding, ResourceGraph, ResourceSpec};

/// リソースの論理名
pub mod names {
    pub const PROVIDER: &str = "escAwsProvider";
    pub const BUCKET: &str = "bucket";
    pub const BUCKET_WEBSITE: &str = "bucketWebsite";
    pub const OWNERSHIP_CONTROLS: &str = "ownershipControls";
    pub const PUBLIC_ACCESS_BLOCK: &str = "publicAccessBlock";
    pub const BUCKET_FOLDER: &str = "bucketFolder";
    pub const CDN: &str = "cdn";
}

/// リソースタイプ
pub mod types {
    pub const BUCKET: &str = "aws:s3:BucketV2";
    pub const BUCKET_WEBSITE: &str = "aws:s3:BucketWebsiteConfigurationV2";
    pub const OWNERSHIP_CONTROLS: &str = "aws:s3:BucketOwnershipControls";
    pub const PUBLIC_ACCESS_BLOCK: &str = "aws:s3:BucketPublicAccessBlock";
    pub const BUCKET_FOLDER: &str = "synced-folder:index:S3BucketFolder";
    pub const DISTRIBUTION: &str = "aws:cloudfront:Distribution";
}

/// 出力名
pub mod outputs {
    pub const ORIGIN_HOSTNAME: &str = "originHostname";
    pub const ORIGIN_URL: &str = "originURL";
    pub const CDN_HOSTNAME: &str = "cdnHostname";
    pub const CDN_URL: &str = "cdnURL";
}

/// CDNキャッシュTTL（秒）。min/default/max 共通
pub const CACHE_TTL_SECONDS: i64 = 600;

const HTTP_METHODS: [&str; 3] = ["GET", "HEAD", "OPTIONS"];

/// デフォルトのプロジェクト名でサイトを宣言
pub fn declare_site(site: &SiteConfig) -> ResourceGraph {
    declare_site_for(crate::model::DEFAULT_PROJECT, site)
}

/// サイトのリソースグラフを宣言
///
/// 同じ入力からは常に同じグラフが得られる。フォルダ同期は所有権設定と
/// パブリックアクセス設定の両方に依存する。
pub fn declare_site_for(project: &str, site: &SiteConfig) -> ResourceGraph {
    let provider = ProviderBinding::new(names::PROVIDER, "aws", &site.region);
    let mut graph = ResourceGraph::new(project, provider);

    let bucket = ResourceSpec::new(names::BUCKET, types::BUCKET, names::PROVIDER);

    let bucket_website = ResourceSpec::new(names::BUCKET_WEBSITE, types::BUCKET_WEBSITE, names::PROVIDER)
        .with_property("bucket", bucket.output("bucket"))
        .with_property(
            "indexDocument",
            PropertyValue::object([("suffix", PropertyValue::from(site.index_document.as_str()))]),
        )
        .with_property(
            "errorDocument",
            PropertyValue::object([("key", PropertyValue::from(site.error_document.as_str()))]),
        );

    let ownership_controls =
        ResourceSpec::new(names::OWNERSHIP_CONTROLS, types::OWNERSHIP_CONTROLS, names::PROVIDER)
            .with_property("bucket", bucket.output("bucket"))
            .with_property(
                "rule",
                PropertyValue::object([("objectOwnership", PropertyValue::from("ObjectWriter"))]),
            );

    let public_access_block =
        ResourceSpec::new(names::PUBLIC_ACCESS_BLOCK, types::PUBLIC_ACCESS_BLOCK, names::PROVIDER)
            .with_property("bucket", bucket.output("bucket"))
            .with_property("blockPublicAcls", false);

    // ACL付きアップロードは両ポリシー適用後でないと拒否される
    let bucket_folder = ResourceSpec::new(names::BUCKET_FOLDER, types::BUCKET_FOLDER, names::PROVIDER)
        .with_property("path", PropertyValue::path(site.path.as_str()))
        .with_property("bucketName", bucket.output("bucket"))
        .with_property("acl", "public-read")
        .with_dependency(names::OWNERSHIP_CONTROLS)
        .with_dependency(names::PUBLIC_ACCESS_BLOCK);

    let cdn = declare_distribution(&bucket, &bucket_website, site);

    graph.add_output(OutputSpec::reference(
        outputs::ORIGIN_HOSTNAME,
        bucket_website.output("websiteEndpoint"),
    ));
    graph.add_output(OutputSpec::prefixed(
        outputs::ORIGIN_URL,
        "http://",
        bucket_website.output("websiteEndpoint"),
    ));
    graph.add_output(OutputSpec::reference(
        outputs::CDN_HOSTNAME,
        cdn.output("domainName"),
    ));
    graph.add_output(OutputSpec::prefixed(
        outputs::CDN_URL,
        "https://",
        cdn.output("domainName"),
    ));

    graph.add(bucket);
    graph.add(bucket_website);
    graph.add(ownership_controls);
    graph.add(public_access_block);
    graph.add(bucket_folder);
    graph.add(cdn);

    graph
}

fn declare_distribution(
    bucket: &ResourceSpec,
    bucket_website: &ResourceSpec,
    site: &SiteConfig,
) -> ResourceSpec {
    let origin = PropertyValue::object([
        ("originId", bucket.output("arn").into()),
        ("domainName", bucket_website.output("websiteEndpoint").into()),
        (
            "customOriginConfig",
            PropertyValue::object([
                ("originProtocolPolicy", PropertyValue::from("http-only")),
                ("httpPort", PropertyValue::from(80u16)),
                ("httpsPort", PropertyValue::from(443u16)),
                ("originSslProtocols", PropertyValue::list(["TLSv1.2"])),
            ]),
        ),
    ]);

    let default_cache_behavior = PropertyValue::object([
        ("targetOriginId", bucket.output("arn").into()),
        ("viewerProtocolPolicy", PropertyValue::from("redirect-to-https")),
        ("allowedMethods", PropertyValue::list(HTTP_METHODS)),
        ("cachedMethods", PropertyValue::list(HTTP_METHODS)),
        ("defaultTtl", PropertyValue::from(CACHE_TTL_SECONDS)),
        ("maxTtl", PropertyValue::from(CACHE_TTL_SECONDS)),
        ("minTtl", PropertyValue::from(CACHE_TTL_SECONDS)),
        (
            "forwardedValues",
            PropertyValue::object([
                ("queryString", PropertyValue::from(true)),
                (
                    "cookies",
                    PropertyValue::object([("forward", PropertyValue::from("all"))]),
                ),
            ]),
        ),
    ]);

    let not_found = PropertyValue::object([
        ("errorCode", PropertyValue::from(404u16)),
        ("responseCode", PropertyValue::from(404u16)),
        ("responsePagePath", PropertyValue::from(site.error_page_path())),
    ]);

    ResourceSpec::new(names::CDN, types::DISTRIBUTION, names::PROVIDER)
        .with_property("enabled", true)
        .with_property("origins", PropertyValue::list([origin]))
        .with_property("defaultCacheBehavior", default_cache_behavior)
        .with_property("priceClass", "PriceClass_100")
        .with_property("customErrorResponses", PropertyValue::list([not_found]))
        .with_property(
            "restrictions",
            PropertyValue::object([(
                "geoRestriction",
                PropertyValue::object([("restrictionType", PropertyValue::from("none"))]),
            )]),
        )
        .with_property(
            "viewerCertificate",
            PropertyValue::object([("cloudfrontDefaultCertificate", PropertyValue::from(true))]),
        )
}
