//! `general.file_type` -> human-readable quantization name.

/// Map a GGUF `general.file_type` value to its human-readable name.
/// Unknown codes map to `"Unknown"` rather than erroring — quantization
/// is advisory metadata, never a parse gate.
pub fn file_type_name(file_type: u32) -> &'static str {
    match file_type {
        0 => "F32",
        1 => "F16",
        2 => "Q4_0",
        3 => "Q4_1",
        4 => "Q4_1_F16",
        5 => "Q4_2",
        6 => "Q4_3",
        7 => "Q8_0",
        8 => "Q5_0",
        9 => "Q5_1",
        10 => "Q2_K",
        11 => "Q3_K_S",
        12 => "Q3_K_M",
        13 => "Q3_K_L",
        14 => "Q4_K_S",
        15 => "Q4_K_M",
        16 => "Q5_K_S",
        17 => "Q5_K_M",
        18 => "Q6_K",
        19 => "IQ2_XXS",
        20 => "IQ2_XS",
        21 => "Q2_K_S",
        22 => "IQ3_XS",
        23 => "IQ3_XXS",
        24 => "IQ1_S",
        25 => "IQ4_NL",
        26 => "IQ3_S",
        27 => "IQ3_M",
        28 => "IQ2_S",
        29 => "IQ2_M",
        30 => "IQ4_XS",
        31 => "IQ1_M",
        32 => "Q4_0_8_8",
        _ => "Unknown",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn known_anchors_match_spec() {
        assert_eq!(file_type_name(0), "F32");
        assert_eq!(file_type_name(1), "F16");
        assert_eq!(file_type_name(2), "Q4_0");
        assert_eq!(file_type_name(15), "Q4_K_M");
        assert_eq!(file_type_name(17), "Q5_K_M");
        assert_eq!(file_type_name(32), "Q4_0_8_8");
    }

    #[test]
    fn unknown_file_type_maps_to_unknown() {
        assert_eq!(file_type_name(9999), "Unknown");
    }
}
