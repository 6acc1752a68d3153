use super::ShareError;

/// Rendering options handed to the QR encoder.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QrRenderOptions {
    pub width: u32,
    pub margin: u32,
    pub dark: String,
    pub light: String,
}

impl Default for QrRenderOptions {
    fn default() -> Self {
        Self {
            width: 200,
            margin: 2,
            dark: "#000000".to_string(),
            light: "#FFFFFF".to_string(),
        }
    }
}

/// An encoded QR image. Hosts fetch it from `url`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QrImage {
    pub url: String,
    pub width: u32,
}

pub trait QrEncoder: Send + Sync {
    fn encode(&self, data: &str, options: &QrRenderOptions) -> Result<QrImage, ShareError>;
}

/// Hands encoding to an HTTP QR image service.
#[derive(Debug, Clone)]
pub struct RemoteQrEncoder {
    endpoint: String,
}

impl RemoteQrEncoder {
    pub fn new(endpoint: impl Into<String>) -> Self {
        Self { endpoint: endpoint.into() }
    }
}

fn hex_color(color: &str) -> Result<String, ShareError> {
    let hex = color.trim_start_matches('#');
    if hex.len() != 6 || !hex.chars().all(|c| c.is_ascii_hexdigit()) {
        return Err(ShareError::QrEncoding(format!("invalid color {}", color)));
    }
    Ok(hex.to_ascii_lowercase())
}

impl QrEncoder for RemoteQrEncoder {
    fn encode(&self, data: &str, options: &QrRenderOptions) -> Result<QrImage, ShareError> {
        if data.is_empty() {
            return Err(ShareError::QrEncoding("nothing to encode".to_string()));
        }
        if options.width == 0 {
            return Err(ShareError::QrEncoding("width must be positive".to_string()));
        }
        let url = format!(
            "{}?size={w}x{w}&margin={}&color={}&bgcolor={}&format=png&data={}",
            self.endpoint,
            options.margin,
            hex_color(&options.dark)?,
            hex_color(&options.light)?,
            urlencoding::encode(data),
            w = options.width,
        );
        Ok(QrImage { url, width: options.width })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builds_service_url_with_encoded_payload() {
        let encoder = RemoteQrEncoder::new("https://qr.example/create");
        let image = encoder
            .encode("https://pollshare.app/poll/a b", &QrRenderOptions::default())
            .unwrap();

        assert_eq!(
            image.url,
            "https://qr.example/create?size=200x200&margin=2&color=000000&bgcolor=ffffff&format=png&data=https%3A%2F%2Fpollshare.app%2Fpoll%2Fa%20b"
        );
        assert_eq!(image.width, 200);
    }

    #[test]
    fn rejects_bad_palette() {
        let encoder = RemoteQrEncoder::new("https://qr.example/create");
        let options = QrRenderOptions { dark: "black".to_string(), ..Default::default() };
        assert!(encoder.encode("x", &options).is_err());
    }
}
