//! Prompt templates for the model-assisted parser.

/// Sentinel that should never appear in real templates.
const ESCAPE_SENTINEL: &str = "\x00LBRACE\x00";
/// Sentinel for escaped closing brace.
const ESCAPE_SENTINEL_CLOSE: &str = "\x00RBRACE\x00";

/// Fixed system instruction describing the six target fields.
pub const SYSTEM_INSTRUCTION: &str = "\
You are an address parser. Split the postal address you are given into exactly these JSON fields:
- \"Address1\": street number and street name
- \"Address2\": apartment, suite, unit, building, floor or room qualifiers
- \"City\": city name
- \"State\": two-letter state abbreviation
- \"ZIP\": 5-digit ZIP code, or ZIP+4
- \"Country\": country name
Use an empty string for any field that is not present. If you are uncertain, make your best inference. \
If the address follows US conventions and no country is given, use \"USA\".
Respond with a single JSON object and nothing else.";

/// User message template; `{input}` is replaced with the literal address.
pub const USER_TEMPLATE: &str = "\
Parse this address into JSON with the keys {{\"Address1\", \"Address2\", \"City\", \"State\", \"ZIP\", \"Country\"}}:

{input}";

/// Substitute `{input}` in a template.
///
/// Use `{{` to insert a literal `{` and `}}` to insert a literal `}`.
///
/// # Example
///
/// ```
/// use address_pipeline::prompt::render;
///
/// let result = render("Parse {input} as {{\"City\": \"...\"}}", "1 Elm St");
/// assert_eq!(result, r#"Parse 1 Elm St as {"City": "..."}"#);
/// ```
pub fn render(template: &str, input: &str) -> String {
    // Pass 1: protect escaped braces
    let mut rendered = template.replace("{{", ESCAPE_SENTINEL);
    rendered = rendered.replace("}}", ESCAPE_SENTINEL_CLOSE);

    // Pass 2: substitute the address
    rendered = rendered.replace("{input}", input);

    // Pass 3: restore escaped braces
    rendered = rendered.replace(ESCAPE_SENTINEL, "{");
    rendered.replace(ESCAPE_SENTINEL_CLOSE, "}")
}

/// The user message for one address.
pub fn user_prompt(address: &str) -> String {
    render(USER_TEMPLATE, address)
}
