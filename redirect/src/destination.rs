use crate::config::DestinationConfig;
use percent_encoding::{AsciiSet, NON_ALPHANUMERIC, utf8_percent_encode};

/// Characters left as-is in the prefilled message.
const MESSAGE_ENCODE_SET: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'-')
    .remove(b'.')
    .remove(b'_')
    .remove(b'~')
    .remove(b'/');

/// WhatsApp click-to-chat link every successful click is redirected to.
#[derive(Clone, Debug)]
pub struct Destination {
    url: String,
}

impl Destination {
    pub fn new(config: &DestinationConfig) -> Self {
        let text = utf8_percent_encode(&config.message, MESSAGE_ENCODE_SET);
        Destination {
            url: format!("https://wa.me/{}?text={}", config.phone_number, text),
        }
    }

    pub fn url(&self) -> &str {
        &self.url
    }
}
