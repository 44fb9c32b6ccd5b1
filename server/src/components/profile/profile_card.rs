use maud::{html, Markup, Render};
use serde_json::Value;

use crate::components::ui::{button::Button, heading::Heading};

/// Read-only dump of the profile document returned by Microsoft Graph
pub struct ProfileCard {
    pub profile: Value,
}

impl ProfileCard {
    pub fn new(profile: Value) -> Self {
        Self { profile }
    }

    fn display_name(&self) -> Option<&str> {
        self.profile.get("displayName").and_then(Value::as_str)
    }

    fn email(&self) -> Option<&str> {
        self.profile
            .get("mail")
            .and_then(Value::as_str)
            .or_else(|| self.profile.get("userPrincipalName").and_then(Value::as_str))
    }

    fn pretty_json(&self) -> String {
        serde_json::to_string_pretty(&self.profile).unwrap_or_else(|_| self.profile.to_string())
    }
}

impl Render for ProfileCard {
    fn render(&self) -> Markup {
        html! {
            (Heading::h1("Profile"))

            @if let Some(name) = self.display_name() {
                p class="text-lg text-gray-700" { "Signed in as " strong { (name) } }
            }
            @if let Some(email) = self.email() {
                p class="text-sm text-gray-500 mb-4" { (email) }
            }

            // maud escapes the JSON, so provider-controlled strings can't inject markup
            pre class="bg-gray-900 text-green-200 text-xs sm:text-sm p-4 rounded-lg overflow-x-auto my-4" {
                (self.pretty_json())
            }

            (Button::secondary("Logout", "/logout").full_width(true))
        }
    }
}
