//! Prompt text sent to the image service for composite operations.

/// Edit instructions applied to a single image.
pub fn edit_prompt(instruction: &str) -> String {
    format!(
        "Edit the provided image as follows: {}. Keep everything else about the image unchanged.",
        instruction
    )
}

/// Merge instructions for two or more images.
pub fn merge_prompt(instruction: &str, image_count: usize) -> String {
    format!(
        "Combine the {} provided images into a single coherent image. {}",
        image_count, instruction
    )
}

/// A video-style thumbnail built around a title.
pub fn thumbnail_prompt(title: &str, style: Option<&str>, image_count: usize) -> String {
    let subjects = if image_count == 1 {
        "the provided image".to_string()
    } else {
        format!("the {} provided images", image_count)
    };

    let mut prompt = format!(
        "Create an eye-catching thumbnail using {} as the main subject. \
         Render the title \"{}\" in large, bold, highly legible lettering.",
        subjects, title
    );
    if let Some(style) = style.map(str::trim).filter(|s| !s.is_empty()) {
        prompt.push_str(&format!(" Visual style: {}.", style));
    }
    prompt
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_edit_prompt_contains_instruction() {
        assert!(edit_prompt("make the sky purple").contains("make the sky purple"));
    }

    #[test]
    fn test_merge_prompt_counts_images() {
        let prompt = merge_prompt("put the cat on the sofa", 3);
        assert!(prompt.contains("3 provided images"));
        assert!(prompt.ends_with("put the cat on the sofa"));
    }

    #[test]
    fn test_thumbnail_prompt() {
        let prompt = thumbnail_prompt("Rust in 100 Seconds", Some("neon"), 1);
        assert!(prompt.contains("the provided image"));
        assert!(prompt.contains("\"Rust in 100 Seconds\""));
        assert!(prompt.contains("Visual style: neon."));

        let prompt = thumbnail_prompt("Title", Some("  "), 2);
        assert!(prompt.contains("the 2 provided images"));
        assert!(!prompt.contains("Visual style"));
    }
}
