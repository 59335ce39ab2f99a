/// Hard ceiling on generated post length, in whitespace-separated words
pub const MAX_SUMMARY_WORDS: usize = 50;

/// Suffix appended when a generated post is cut at the word ceiling
pub const TRUNCATION_SUFFIX: &str = "...";

/// Maximum characters accepted in a post body
pub const MAX_POST_TEXT_CHARS: usize = 1000;

/// Maximum username length
pub const MAX_USERNAME_CHARS: usize = 32;

/// Random bytes in a freshly issued API key (hex encoded to 32 chars)
pub const API_KEY_BYTES: usize = 16;

/// Attempts at drawing a fresh post id when the random one is taken
pub const MAX_POST_ID_ATTEMPTS: usize = 5;

/// Default and maximum page size for the post feed
pub const DEFAULT_PAGE_SIZE: u32 = 10;
pub const MAX_PAGE_SIZE: u32 = 100;

/// Upper bounds for the placeholder engagement counters
pub const MAX_PLACEHOLDER_LIKES: i32 = 100;
pub const MAX_PLACEHOLDER_RETWEETS: i32 = 50;
pub const MAX_PLACEHOLDER_REPLIES: i32 = 20;

/// Completion service defaults (Groq, OpenAI-compatible API)
pub const DEFAULT_COMPLETION_BASE_URL: &str = "https://api.groq.com/openai/v1";
pub const DEFAULT_COMPLETION_MODEL: &str = "llama-3.1-8b-instant";

/// Schema of the historical post table the pipeline queries
pub const POSTS_SCHEMA_DESCRIPTION: &str = "Table: tweets
Columns:
- id (SERIAL) [PK]
- author (TEXT)
- text (TEXT)
- embedding (VECTOR(768))
- retweets (INT)
- likes (INT)
- timestamp (TIMESTAMP)";

// =============================================================================
// Headers
// =============================================================================

/// Header names accepted for the caller's API key
pub const API_KEY_HEADERS: [&str; 2] = ["x-api-key", "api-key"];

/// Header the publisher sends its shared secret in
pub const PUBLISH_KEY_HEADER: &str = "api-key";

// =============================================================================
// Error Messages
// =============================================================================

pub const ERR_MISSING_API_KEY: &str = "Missing API Key";
pub const ERR_INVALID_API_KEY: &str = "Invalid API Key";
pub const ERR_USERNAME_MISMATCH: &str = "API Key does not match username";
pub const ERR_NOT_POST_OWNER: &str = "API Key does not own this tweet";
pub const ERR_INVALID_USERNAME: &str =
    "Username must be 1-32 characters of letters, digits or underscores";
