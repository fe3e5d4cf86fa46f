use std::net::{Ipv4Addr, Ipv6Addr};
use url::{Host, Url};

/// URL 最大長度
pub const MAX_URL_LEN: usize = 2000;

/// 接受的圖片副檔名
pub const IMAGE_EXTENSIONS: &[&str] = &[".jpg", ".jpeg", ".png", ".gif", ".webp"];

const BLOCKED_HOSTS: &[&str] = &["localhost", "127.0.0.1", "0.0.0.0", "::1"];

/// 判斷字串是否為可接受的圖片 URL
///
/// `trusted` 表示 URL 來自保證為圖片的欄位（API 或純圖片 CDN），
/// 此時略過副檔名檢查，但長度、scheme、host 規則仍然適用。
pub fn validate(url: &str, trusted: bool) -> bool {
    if url.len() > MAX_URL_LEN {
        return false;
    }

    let Ok(parsed) = Url::parse(url) else {
        return false;
    };

    if !matches!(parsed.scheme(), "http" | "https") {
        return false;
    }

    match parsed.host() {
        Some(host) if is_public_host(&host) => {}
        _ => return false,
    }

    trusted || has_image_extension(parsed.path())
}

/// 一般來源使用：必須有圖片副檔名
pub fn is_valid_image_url(url: &str) -> bool {
    validate(url, false)
}

fn is_public_host(host: &Host<&str>) -> bool {
    match host {
        Host::Domain(domain) => {
            let domain = domain.trim_end_matches('.').to_ascii_lowercase();
            !BLOCKED_HOSTS.contains(&domain.as_str())
        }
        Host::Ipv4(ip) => !is_blocked_v4(ip),
        Host::Ipv6(ip) => !is_blocked_v6(ip),
    }
}

fn is_blocked_v4(ip: &Ipv4Addr) -> bool {
    ip.is_loopback() || ip.is_unspecified() || ip.is_link_local()
}

fn is_blocked_v6(ip: &Ipv6Addr) -> bool {
    if let Some(v4) = ip.to_ipv4_mapped() {
        return is_blocked_v4(&v4);
    }
    // fe80::/10
    ip.is_loopback() || ip.is_unspecified() || (ip.segments()[0] & 0xffc0) == 0xfe80
}

fn has_image_extension(path: &str) -> bool {
    let path = path.to_ascii_lowercase();
    IMAGE_EXTENSIONS.iter().any(|ext| path.ends_with(ext))
}
