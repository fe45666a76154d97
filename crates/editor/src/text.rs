/// Converts document markup to plain text.
///
/// Supplied by the hosting application; the session only forwards markup to it.
pub trait TextExtractor {
	fn extract(&self, html: &str) -> String;
}

impl<F> TextExtractor for F
where
	F: Fn(&str) -> String,
{
	fn extract(&self, html: &str) -> String {
		self(html)
	}
}
