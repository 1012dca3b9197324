//! URL sanitization ahead of `InputStream::open`: the player
//! is strictly client-side, so any `listen`/`listen_timeout` query parameter
//! on an `rtmp`/`tcp` URL is stripped before FFmpeg ever sees it.

/// Strips `listen` and `listen_timeout` query parameters from `rtmp://` and
/// `tcp://` URLs. Leaves every other scheme (including `rtsp://`) untouched.
pub fn sanitize_url(url: &str) -> String {
    let scheme_end = match url.find("://") {
        Some(i) => i,
        None => return url.to_string(),
    };
    let scheme = &url[..scheme_end];
    if scheme != "rtmp" && scheme != "tcp" {
        return url.to_string();
    }

    let Some(q_idx) = url.find('?') else {
        return url.to_string();
    };
    let (base, query) = url.split_at(q_idx);
    let query = &query[1..]; // drop leading '?'

    let kept: Vec<&str> = query
        .split('&')
        .filter(|pair| {
            let key = pair.split('=').next().unwrap_or("");
            key != "listen" && key != "listen_timeout"
        })
        .collect();

    if kept.is_empty() {
        base.to_string()
    } else {
        format!("{base}?{}", kept.join("&"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn strips_listen_and_listen_timeout_from_rtmp() {
        let sanitized = sanitize_url("rtmp://host/app/stream?listen=1&listen_timeout=30");
        assert_eq!(sanitized, "rtmp://host/app/stream");
    }

    #[test]
    fn leaves_other_query_params_intact() {
        let sanitized = sanitize_url("rtmp://host/app/stream?listen=1&token=abc");
        assert_eq!(sanitized, "rtmp://host/app/stream?token=abc");
    }

    #[test]
    fn leaves_rtsp_untouched() {
        let sanitized = sanitize_url("rtsp://host/stream?listen=1");
        assert_eq!(sanitized, "rtsp://host/stream?listen=1");
    }

    #[test]
    fn leaves_urls_without_query_untouched() {
        assert_eq!(sanitize_url("rtmp://host/app/stream"), "rtmp://host/app/stream");
    }
}
