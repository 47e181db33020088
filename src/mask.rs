//! PII masking for logs and echoed contact details.

/// Keep the first `head` and last `tail` characters, star the rest.
fn mask_middle(value: &str, head: usize, tail: usize) -> String {
    let chars: Vec<char> = value.chars().collect();
    if chars.len() <= head + tail {
        return "*".repeat(chars.len());
    }
    chars
        .iter()
        .enumerate()
        .map(|(i, c)| {
            if i < head || i >= chars.len() - tail {
                *c
            } else {
                '*'
            }
        })
        .collect()
}

/// `AB12345` -> `AB***45`
pub fn client_id(value: &str) -> String {
    mask_middle(value, 2, 2)
}

/// `jane.doe@example.com` -> `ja******@example.com`
pub fn email(value: &str) -> String {
    match value.split_once('@') {
        Some((local, domain)) => format!("{}@{}", mask_middle(local, 2, 0), domain),
        None => mask_middle(value, 2, 0),
    }
}

/// `9876543210` -> `******3210`
pub fn phone(value: &str) -> String {
    mask_middle(value, 0, 4)
}

/// `001234567890` -> `********7890`
pub fn account_number(value: &str) -> String {
    mask_middle(value, 0, 4)
}

/// `ABCDE1234F` -> `AB******4F`
pub fn pan(value: &str) -> String {
    mask_middle(value, 2, 2)
}

/// `jane@okbank` -> `ja**@okbank`
pub fn upi(value: &str) -> String {
    email(value)
}
