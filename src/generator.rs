//! RedNote-style post generation.

use crate::api::AskAsync;
use crate::models::{CandidateArticle, GeneratedPost};
use crate::post::{
    BODY_END, BODY_START, TAGS_END, TAGS_START, TITLE_END, TITLE_START, parse_post, render_post,
};
use crate::utils::{take_chars, truncate_for_log};
use tracing::{debug, error, info, instrument, warn};

/// Turns a selected article into a post.
///
/// The pipeline only depends on this trait, so a run can be driven without a
/// model behind it.
pub trait PostGenerator {
    /// Write a post for `article`, or `None` when the model call or the
    /// reply format fails. Failures are logged here.
    async fn generate(&self, article: &CandidateArticle) -> Option<GeneratedPost>;
}

/// User prompt for one article: its title, the head of its content, and the
/// reply format.
///
/// # Arguments
/// * `article` - Article with extracted content
/// * `content_chars` - How many leading characters of the content to include
///
/// # Returns
/// The prompt text, asking for the delimited format [`parse_post`] reads.
pub fn build_prompt(article: &CandidateArticle, content_chars: usize) -> String {
    format!(
        "请根据以下文章信息，生成一篇小红书风格的文案，包含标题、正文内容和标签。

文章标题: {title}
文章内容: {content}

要求:
1. 标题要有吸引力，使用小红书常用的emoji，单独一行返回
2. 正文内容要通俗易懂，面向普通读者，使用小红书风格的语言，单独一行返回
3. 标签要以#开头，用空格分隔，单独一行返回
4. 严格按照以下格式返回，不要包含其他解释文字:
{TITLE_START}
你的标题内容
{TITLE_END}
{BODY_START}
你的正文内容
{BODY_END}
{TAGS_START}
#标签1 #标签2 #标签3 #标签4 #标签5 #标签6 #标签7 #标签8
{TAGS_END}
",
        title = article.title,
        content = take_chars(&article.content, content_chars),
    )
}

/// Generates posts with a language model.
///
/// One model call per article. Retries belong to the client, see
/// [`crate::api::RetryAsk`].
#[derive(Debug)]
pub struct LlmPostGenerator<A> {
    client: A,
    prompt_content_chars: usize,
}

impl<A> LlmPostGenerator<A>
where
    A: AskAsync<Response = String>,
{
    /// # Arguments
    /// * `client` - Model client answering with raw text
    /// * `prompt_content_chars` - Characters of article content put in each prompt
    pub fn new(client: A, prompt_content_chars: usize) -> Self {
        Self {
            client,
            prompt_content_chars,
        }
    }
}

impl<A> PostGenerator for LlmPostGenerator<A>
where
    A: AskAsync<Response = String>,
{
    #[instrument(level = "info", skip_all, fields(title = %truncate_for_log(&article.title, 50)))]
    async fn generate(&self, article: &CandidateArticle) -> Option<GeneratedPost> {
        let prompt = build_prompt(article, self.prompt_content_chars);
        let reply = match self.client.ask(&prompt).await {
            Ok(reply) => reply,
            Err(e) => {
                error!(error = %e, "Model call failed; skipping article");
                return None;
            }
        };

        match parse_post(&reply) {
            Some(post) => {
                info!(post_title = %post.title, tags = post.tags.len(), "Generated post");
                debug!(post = %render_post(&post), "Parsed reply");
                Some(post)
            }
            None => {
                warn!(
                    reply_preview = %truncate_for_log(&reply, 300),
                    "Model reply does not follow the post format; skipping article"
                );
                None
            }
        }
    }
}
