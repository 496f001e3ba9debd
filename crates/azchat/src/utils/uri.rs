/// Strips every trailing slash so paths can be appended with `format!`.
///
/// # Examples
/// ```
/// use azchat::utils::uri::ensure_no_trailing_slash;
/// assert_eq!(ensure_no_trailing_slash("https://res.openai.azure.com/"), "https://res.openai.azure.com");
///
/// // Works with owned String too
/// let url = String::from("https://res.openai.azure.com//");
/// assert_eq!(ensure_no_trailing_slash(url), "https://res.openai.azure.com");
/// ```
pub fn ensure_no_trailing_slash<S>(url: S) -> String
where
    S: Into<String>,
{
    let mut url = url.into();
    let len = url.trim_end_matches('/').len();
    url.truncate(len);
    url
}
