use std::collections::HashMap;

use once_cell::sync::Lazy;

const ASSETS: &[(&[u8], &str)] = &[(
    include_bytes!("assets/style.css") as &[u8],
    "text/css; charset=utf-8",
)];

pub(crate) static ASSETS_MAP: Lazy<HashMap<&str, usize>> =
    Lazy::new(|| HashMap::from([(r"/assets/style.css", 0)]));

pub(crate) fn get(path: &str) -> Option<(&'static [u8], &'static str)> {
    ASSETS_MAP.get(path).map(|idx| ASSETS[*idx])
}
