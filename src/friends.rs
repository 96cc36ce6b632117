//! The friend-host allow-list and the canonical origin.
//!
//! This is the one place the list lives. Every entry point (the edge
//! handler, `friendgate check`, `/health`) reads [`FRIENDS`] rather than
//! carrying its own copy.

use std::collections::HashSet;
use std::sync::LazyLock;

/// Origin every friend redirect resolves to.
pub const CANONICAL_ORIGIN: &str = "https://www.tnxg.moe";

/// Hosts permitted to link here with the redirect courtesy.
///
/// Matching is case-sensitive against these exact strings. Hosts parsed
/// from `Referer`/`Origin` are already lowercased by URL parsing.
pub const FRIEND_HOSTS: &[&str] = &[
    "blog.utermux.dev",
    "blog.wututu.cn",
    "chenxi.in",
    "innei.in",
    "qingfengnb.cn",
    "blog.tianli0.top",
    "www.594594.xyz",
    "www.ilovemath.xyz",
    "www.monoko.jp",
    "www.imcharon.com",
    "blog.xlenco.top",
    "www.ssstttar.com",
    "www.timochan.cn",
    "arthals.ink",
    "www.xiaohanwu.com",
    "zwh.moe",
    "blog.oxysc.cc",
    "xxu.do",
    "www.matto.top",
    "0u0.ren",
    "www.saroprock.com",
    "blog.zhilu.site",
    "blog.ahzoo.cn",
    "blog.lkurococ.top",
    "blog.yaria.top",
    "blog.linux-qitong.top",
    "www.gardenwalk.moe",
    "www.kindyear.cn",
    "note.moxiify.cn",
    "caelum.moe",
    "blog.ciraos.top",
    "blog.redish101.top",
    "blog.alayedong.cn",
    "yuuu.org",
    "blog.lolita.best",
    "blog.knlde.top",
    "www.ctrlife.cn",
    "pinpe.top",
    "blog.shenley.cn",
    "www.linexic.top",
    "sfkm.me",
    "nichijou.moe",
    "blog.trfox.top",
    "ttio.cc",
];

/// Process-wide friend set, built on first use and never mutated.
pub static FRIENDS: LazyLock<FriendHosts> =
    LazyLock::new(|| FriendHosts::new(FRIEND_HOSTS.iter().copied()));

#[derive(Debug, Clone, Default)]
pub struct FriendHosts {
    hosts: HashSet<String>,
}

impl FriendHosts {
    pub fn new<I, S>(hosts: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            hosts: hosts.into_iter().map(Into::into).collect(),
        }
    }

    #[must_use]
    pub fn contains(&self, host: &str) -> bool {
        self.hosts.contains(host)
    }

    /// Membership test, optionally ignoring a leading `www.` on either side.
    #[must_use]
    pub fn matches(&self, host: &str, www_insensitive: bool) -> bool {
        if self.contains(host) {
            return true;
        }
        if !www_insensitive {
            return false;
        }
        if let Some(bare) = host.strip_prefix("www.") {
            if self.contains(bare) {
                return true;
            }
        }
        self.contains(&format!("www.{host}"))
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.hosts.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.hosts.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.hosts.iter().map(String::as_str)
    }
}
