//! Error Alert Component
//!
//! Bootstrap alert rendered into the errors region after a rejected or
//! failed operation.

use leptos::prelude::*;

use crate::dom::RETRY_BUTTON_CLASS;

/// Danger alert with an optional retry button
///
/// # Arguments
/// * `message` - Text shown to the user
/// * `retry_label` - Caption of the retry button; no button when None
#[component]
pub fn ErrorAlert(message: String, retry_label: Option<String>) -> impl IntoView {
    let retry_class = format!("btn btn-link alert-link p-0 ms-2 {}", RETRY_BUTTON_CLASS);

    view! {
        <div class="alert alert-danger" role="alert">
            <span class="o_portal_error_message">{message}</span>
            {retry_label.map(|label| {
                view! {
                    <button type="button" class=retry_class>
                        {label}
                    </button>
                }
            })}
        </div>
    }
}
