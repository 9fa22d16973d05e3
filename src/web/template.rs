use tera::Tera;

use crate::result::Result;

const TEMPLATES: &[(&str, &str)] = &[
    ("base.html", include_str!("templates/base.html")),
    ("home.html", include_str!("templates/home.html")),
    ("upload.html", include_str!("templates/upload.html")),
    ("quiz.html", include_str!("templates/quiz.html")),
    ("404.html", include_str!("templates/404.html")),
];

pub(crate) fn init() -> Result<Tera> {
    let mut tera = Tera::default();
    tera.add_raw_templates(TEMPLATES.iter().copied())?;
    tera.autoescape_on(vec![".html"]);
    Ok(tera)
}
