use featbot_bedrock::context::{augment_prompt, conversation_system_prompt};

#[test]
fn prompt_without_kb_answer_is_unchanged() {
    assert_eq!(augment_prompt("What is X?", None), "What is X?");
}

#[test]
fn blank_kb_answer_is_ignored() {
    assert_eq!(augment_prompt("What is X?", Some("  \n")), "What is X?");
}

#[test]
fn kb_answer_is_embedded_with_instruction() {
    let prompt = augment_prompt("What is X?", Some("X is a feature transform."));
    assert_eq!(
        prompt,
        "Question: What is X?\n\n\
         Relevant information from knowledge base: X is a feature transform.\n\n\
         Please provide a complete answer."
    );
}

#[test]
fn empty_context_gives_bare_preamble() {
    let system = conversation_system_prompt("");
    assert!(system.starts_with("The following is a friendly conversation"));
    assert!(!system.contains("Current conversation:"));
}

#[test]
fn context_is_appended_after_preamble() {
    let system = conversation_system_prompt("Human: hi\nAI: hello");
    assert!(system.ends_with("Current conversation:\nHuman: hi\nAI: hello"));
}
