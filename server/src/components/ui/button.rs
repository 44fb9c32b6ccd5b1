use maud::{html, Markup, Render};

#[derive(Debug, Clone, PartialEq)]
pub enum ButtonVariant {
    Primary,
    Secondary,
}

/// A link styled as a button
pub struct Button {
    pub text: String,
    pub href: String,
    pub variant: ButtonVariant,
    pub full_width: bool,
}

impl Button {
    pub fn primary(text: &str, href: &str) -> Self {
        Self {
            text: text.to_string(),
            href: href.to_string(),
            variant: ButtonVariant::Primary,
            full_width: false,
        }
    }

    pub fn secondary(text: &str, href: &str) -> Self {
        Self {
            variant: ButtonVariant::Secondary,
            ..Self::primary(text, href)
        }
    }

    pub fn full_width(mut self, full_width: bool) -> Self {
        self.full_width = full_width;
        self
    }

    fn get_variant_classes(&self) -> &'static str {
        match self.variant {
            ButtonVariant::Primary => "bg-blue-600 hover:bg-blue-700 active:bg-blue-800 text-white shadow-sm hover:shadow",
            ButtonVariant::Secondary => "bg-white hover:bg-gray-50 active:bg-gray-100 text-blue-600 border border-blue-300 hover:border-blue-400",
        }
    }
}

impl Render for Button {
    fn render(&self) -> Markup {
        let width_class = if self.full_width { "w-full" } else { "" };
        let classes = format!(
            "{} {} py-2.5 px-4 font-medium rounded-lg transition-all duration-200 inline-flex items-center justify-center",
            self.get_variant_classes(),
            width_class,
        );

        html! {
            a href=(self.href) class=(classes) { (self.text) }
        }
    }
}
