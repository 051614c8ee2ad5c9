use lore_config::Rag;
use lore_domain::{ContextBlock, Prompt};

pub fn build_prompt(rag: &Rag, question: &str, blocks: Vec<ContextBlock>) -> Prompt {
	Prompt {
		system_instruction: rag.system_instruction.clone(),
		context_blocks: blocks,
		user_question: question.to_string(),
		output_constraint: rag.output_constraint.clone(),
	}
}
