/// Token replaced by the generated code in message templates.
pub const OTP_PLACEHOLDER: &str = "{otp}";

pub const DEFAULT_MESSAGE_TEMPLATE: &str =
    "Your verification code is {otp}. It expires in 5 minutes. Do not share this code with anyone.";

/// Substitute `code` for the first placeholder in `template`.
///
/// A template without a placeholder gets the code appended, so the recipient
/// always receives it.
pub fn render_message(template: &str, code: &str) -> String {
    if template.contains(OTP_PLACEHOLDER) {
        template.replacen(OTP_PLACEHOLDER, code, 1)
    } else {
        format!("{} {}", template.trim_end(), code)
    }
}
