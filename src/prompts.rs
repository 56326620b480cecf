pub const TRY_ON_INSTRUCTION: &str = include_str!("../data/prompts/try_on.txt");
