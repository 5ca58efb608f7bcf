//! スタック出力の射影
//!
//! エンジンが報告した属性値から4つの出力を組み立てる。まだ値が得られて
//! いない出力は `None` のまま残す。

use crate::stack::outputs;
use ppinfra_cloud::{AttributeSet, ResourceGraph};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StackOutputs {
    #[serde(rename = "originHostname")]
    pub origin_hostname: Option<String>,

    #[serde(rename = "originURL")]
    pub origin_url: Option<String>,

    #[serde(rename = "cdnHostname")]
    pub cdn_hostname: Option<String>,

    #[serde(rename = "cdnURL")]
    pub cdn_url: Option<String>,
}

impl StackOutputs {
    /// グラフの出力定義を属性値で解決
    pub fn project(graph: &ResourceGraph, attributes: &AttributeSet) -> Self {
        let resolve = |name: &str| {
            graph
                .output(name)
                .and_then(|output| output.resolve(|r| attributes.get(r)))
        };
        Self {
            origin_hostname: resolve(outputs::ORIGIN_HOSTNAME),
            origin_url: resolve(outputs::ORIGIN_URL),
            cdn_hostname: resolve(outputs::CDN_HOSTNAME),
            cdn_url: resolve(outputs::CDN_URL),
        }
    }

    /// 出力名と値の一覧（宣言順）
    pub fn entries(&self) -> [(&'static str, Option<&str>); 4] {
        [
            (outputs::ORIGIN_HOSTNAME, self.origin_hostname.as_deref()),
            (outputs::ORIGIN_URL, self.origin_url.as_deref()),
            (outputs::CDN_HOSTNAME, self.cdn_hostname.as_deref()),
            (outputs::CDN_URL, self.cdn_url.as_deref()),
        ]
    }

    pub fn is_complete(&self) -> bool {
        self.entries().iter().all(|(_, v)| v.is_some())
    }
}
