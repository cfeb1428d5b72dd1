/// Splits a command line into whitespace-separated tokens.
///
/// Quotes and escapes carry no meaning; a name containing spaces cannot be expressed.
pub fn tokenize(input: &str) -> Vec<String> {
    input.split_whitespace().map(str::to_string).collect()
}
