//! Static files for the browser view, compiled into the binary.

pub const INDEX_HTML: &str = include_str!("assets/index.html");

pub struct StaticAsset {
    pub body: &'static str,
    pub content_type: &'static str,
}

pub fn lookup(file: &str) -> Option<StaticAsset> {
    let (body, content_type) = match file {
        "styles.css" => (include_str!("assets/styles.css"), "text/css; charset=utf-8"),
        "app.js" => (
            include_str!("assets/app.js"),
            "application/javascript; charset=utf-8",
        ),
        _ => return None,
    };
    Some(StaticAsset { body, content_type })
}
