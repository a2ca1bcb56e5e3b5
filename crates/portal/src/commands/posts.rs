use async_trait::async_trait;
use comfy_table::Cell;
use eyre::Result;
use portal_core::AppState;
use portal_core::document::Document;
use portal_core::services::Page;
use portal_core::services::posts::{
    MyPostsQuery, Post, PostCreate, PostListItem, PostQuery, PostSort, PostStatus, SortOrder,
};
use std::io::{Read, Write};
use std::path::PathBuf;

use super::{Command, short_time, table};

pub struct PostsCommand {
    pub action: PostsAction,
}

pub enum PostsAction {
    List {
        query: PostQuery,
    },
    Mine {
        status: Option<PostStatus>,
        page: u32,
    },
    Show {
        post: String,
    },
    Create {
        title: String,
        file: Option<PathBuf>,
        category: Option<i64>,
        tags: Vec<i64>,
        draft: bool,
    },
    Delete {
        id: i64,
    },
}

impl PostsAction {
    #[expect(clippy::too_many_arguments)]
    pub fn list(
        search: Option<String>,
        category: Option<i64>,
        tag: Option<i64>,
        featured: bool,
        page: u32,
        size: u32,
        sort: Option<PostSort>,
        order: Option<SortOrder>,
    ) -> Self {
        Self::List {
            query: PostQuery {
                q: search.filter(|s| !s.trim().is_empty()),
                category_id: category,
                tag_id: tag,
                is_featured: featured.then_some(true),
                page: Some(page),
                size: Some(size),
                sort_by: sort,
                sort_order: order,
            },
        }
    }
}

#[async_trait]
impl Command for PostsCommand {
    async fn execute(&self, state: &AppState) -> Result<()> {
        let posts = state.services()?.posts;
        let mut stdout = std::io::stdout();

        match &self.action {
            PostsAction::List { query } => {
                let page = posts.list(query).await?;
                write_page(&mut stdout, &page)?;
            }
            PostsAction::Mine { status, page } => {
                let page = posts
                    .mine(&MyPostsQuery {
                        status: *status,
                        page: Some(*page),
                        size: None,
                    })
                    .await?;
                write_page(&mut stdout, &page)?;
            }
            PostsAction::Show { post } => {
                let post = match post.parse::<i64>() {
                    Ok(id) => posts.get(id).await?,
                    Err(_) => posts.by_slug(post).await?,
                };
                write_post(&mut stdout, &post)?;
            }
            PostsAction::Create {
                title,
                file,
                category,
                tags,
                draft,
            } => {
                let text = read_body(file.as_deref())?;
                let mut create = PostCreate::new(title.clone(), Document::from_plain_text(&text));
                create.category_id = *category;
                create.tag_ids = tags.clone();
                create.status = Some(if *draft {
                    PostStatus::Draft
                } else {
                    PostStatus::Published
                });

                let post = posts.create(&create).await?;
                writeln!(stdout, "Created post {} ({})", post.id, post.slug)?;
            }
            PostsAction::Delete { id } => {
                posts.delete(*id).await?;
                writeln!(stdout, "Deleted post {id}")?;
            }
        }
        Ok(())
    }
}

fn read_body(file: Option<&std::path::Path>) -> std::io::Result<String> {
    match file {
        Some(path) => std::fs::read_to_string(path),
        None => {
            let mut text = String::new();
            std::io::stdin().read_to_string(&mut text)?;
            Ok(text)
        }
    }
}

fn write_page(out: &mut impl Write, page: &Page<PostListItem>) -> std::io::Result<()> {
    if page.items.is_empty() {
        return writeln!(out, "No posts found.");
    }

    let mut table = table(&["ID", "Title", "Author", "Status", "Likes", "Comments", "Date"]);
    for post in &page.items {
        let date = post.published_at.as_deref().unwrap_or(&post.created_at);
        let title = if post.is_featured {
            format!("★ {}", post.title)
        } else {
            post.title.clone()
        };
        table.add_row(vec![
            Cell::new(post.id),
            Cell::new(title),
            Cell::new(post.user.display_name()),
            Cell::new(&post.status),
            Cell::new(post.like_count),
            Cell::new(post.comment_count),
            Cell::new(short_time(date)),
        ]);
    }
    writeln!(out, "{table}")?;
    writeln!(
        out,
        "Page {} of {} ({} posts)",
        page.page,
        page.pages.max(1),
        page.total
    )
}

fn write_post(out: &mut impl Write, post: &Post) -> std::io::Result<()> {
    writeln!(out, "{}", post.title)?;
    let mut byline = format!("by {}", post.user.display_name());
    if let Some(category) = &post.category {
        byline.push_str(&format!(" in {}", category.name));
    }
    if let Some(published) = &post.published_at {
        byline.push_str(&format!(" on {}", short_time(published)));
    }
    writeln!(out, "{byline}")?;
    if !post.tags.is_empty() {
        let tags: Vec<_> = post.tags.iter().map(|t| format!("#{}", t.name)).collect();
        writeln!(out, "{}", tags.join(" "))?;
    }
    writeln!(out)?;
    writeln!(out, "{}", post.content.plain_text())?;
    writeln!(
        out,
        "\n{} views · {} likes · {} comments",
        post.view_count, post.like_count, post.comment_count
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn blank_search_is_not_sent() {
        let PostsAction::List { query } =
            PostsAction::list(Some("  ".into()), None, None, true, 2, 10, None, None)
        else {
            unreachable!()
        };
        assert_eq!(query.q, None);
        assert_eq!(query.is_featured, Some(true));
        assert_eq!(query.page, Some(2));
    }

    #[test]
    fn post_renders_as_plain_text() {
        let post: Post = serde_json::from_value(json!({
            "id": 4,
            "title": "Notes on ownership",
            "slug": "notes-on-ownership",
            "content": {"type": "doc", "content": [
                {"type": "paragraph", "content": [{"type": "text", "text": "Borrow, then return."}]}
            ]},
            "status": "published",
            "created_at": "2024-02-02T09:00:00",
            "updated_at": "2024-02-02T09:00:00",
            "published_at": "2024-02-03T09:30:00",
            "user": {"id": 1, "username": "lin", "nickname": "Lin", "avatar": null},
            "category": null,
            "tags": [{"id": 2, "name": "rust", "slug": "rust"}]
        }))
        .unwrap();

        let mut out = Vec::new();
        write_post(&mut out, &post).unwrap();
        let text = String::from_utf8(out).unwrap();
        assert!(text.starts_with("Notes on ownership\nby Lin on 2024-02-03T09:30\n#rust\n"));
        assert!(text.contains("Borrow, then return."));
    }
}
