use crate::error::ExtractError;
use crate::generation::ChatModel;
use crate::schema::{format_instructions, parse_model_response, PoBillData};
use crate::store::{VectorIndex, DEFAULT_TOP_K};
use tracing::debug;

/// Fixed retrieval query used to pull extraction context from a
/// document's collection.
pub const RETRIEVAL_QUERY: &str = "Extract all details from this purchase order";

const PROMPT_HEADER: &str = "\
You are a world-class invoice and purchase order document extractor.

Extract the following structured data from the context below:

- PO number
- PO date
- Vendor name, address, contact
- Buyer name, address, contact
- Shipping address
- Billing address
- Line items (name, description, quantity, unit price, total price)
- Subtotal
- Tax
- Total amount
- Terms & Conditions

If something is not present, output null. Respond in correct JSON format.";

fn build_prompt(context: &str) -> String {
    format!(
        "{PROMPT_HEADER}\n\n{}\n\nContext:\n{context}",
        format_instructions()
    )
}

/// Runs one extraction request: retrieve context chunks, prompt the
/// generation service with the schema-constrained template, and strictly
/// parse the reply. Fails fast at each stage; a caller that wants a retry
/// restarts the whole request.
pub struct ExtractionEngine<C> {
    chat: C,
    top_k: usize,
}

impl<C> ExtractionEngine<C>
where
    C: ChatModel + Send + Sync,
{
    pub fn new(chat: C) -> Self {
        Self {
            chat,
            top_k: DEFAULT_TOP_K,
        }
    }

    pub fn with_top_k(mut self, top_k: usize) -> Self {
        self.top_k = top_k.max(1);
        self
    }

    pub async fn extract<I>(&self, index: &I, collection: &str) -> Result<PoBillData, ExtractError>
    where
        I: VectorIndex + Sync,
    {
        debug!(collection, top_k = self.top_k, "retrieving context");
        let hits = index.query(collection, RETRIEVAL_QUERY, self.top_k).await?;
        let context = hits
            .iter()
            .map(|hit| hit.content.as_str())
            .collect::<Vec<_>>()
            .join("\n\n");

        debug!(collection, chunks = hits.len(), "prompting generation service");
        let prompt = build_prompt(&context);
        let raw = self.chat.complete(&prompt).await?;

        debug!(collection, response_len = raw.len(), "parsing model response");
        let record = parse_model_response(&raw)?;
        Ok(record)
    }
}
