use maud::{html, Markup, Render};

/// Page title
pub struct Heading {
    pub text: String,
}

impl Heading {
    pub fn h1(text: &str) -> Self {
        Self {
            text: text.to_string(),
        }
    }
}

impl Render for Heading {
    fn render(&self) -> Markup {
        html! { h1 class="text-3xl font-bold mb-3 text-gray-800" { (self.text) } }
    }
}
