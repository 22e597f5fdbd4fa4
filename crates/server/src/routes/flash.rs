//! Flash message codes.
//!
//! Domain failures surface as redirects carrying a short `?error=` or
//! `?success=` code; page handlers translate the code back into copy here.
//! Unknown codes render a generic message rather than echoing the query
//! string into the page.

/// Human-readable message for an error code.
#[must_use]
pub fn error_message(code: &str) -> String {
    match code {
        "credentials" => "Invalid username or passcode.",
        "admin_credentials" => "Invalid staff credentials.",
        "username_short" => "Username must be at least 3 characters.",
        "username_long" => "That username is too long.",
        "passcode_short" => "Passcode must be at least 4 characters.",
        "username_taken" => "That username is already taken.",
        "not_found" => "No customer with that username.",
        "stamps" => "Not enough stamps for a free drink yet.",
        "pin" => "Wrong staff PIN.",
        "session" => "Session error, please try again.",
        _ => "Something went wrong, please try again.",
    }
    .to_string()
}

/// Human-readable message for a success code.
#[must_use]
pub fn success_message(code: &str) -> String {
    match code {
        "stamped" => "Stamp added.",
        "redeemed" => "Free drink redeemed. Enjoy!",
        "reset" => "Passcode updated.",
        "logged_out" => "You have been logged out.",
        _ => "Done.",
    }
    .to_string()
}
