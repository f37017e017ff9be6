use gfxsl_text::tokens::*;
use gfxsl_text::*;

/// Transforms tokens back into a string by copying each token's source range
pub fn unlex(tokens: &[PreprocessToken], source_manager: &SourceManager) -> String {
    let mut output = String::new();
    for token in tokens {
        let start_location = token.get_location();
        let end_location = token.get_end_location();
        let (file_id, offset) = match source_manager.get_file_offset_from_source_location(start_location) {
            Some(found) => found,
            None => {
                // Preprocessor output tokens always come from a loaded file
                debug_assert!(false, "unlex does not support unlocated tokens");
                continue;
            }
        };

        // Tokens represent a contiguous range inside a single file
        let size = (end_location.get_raw() - start_location.get_raw()) as usize;
        let start = &source_manager.get_contents(file_id).as_bytes()[offset.0 as usize..];
        if start.is_empty() && token.0 == Token::Endline {
            // Auto inserted line ending at the end of a file
            output.push('\n');
            continue;
        }

        // Strip the \ from the non-logical line endings
        let range = if token.0 == Token::PhysicalEndline {
            &start[1..size]
        } else {
            &start[..size]
        };

        output.push_str(&String::from_utf8_lossy(range));
    }
    output
}
