use clap::Parser;
use portal::ai::ImageSize;
use portal::cli::args::{PostsCommands, PreferencesCommands};
use portal::cli::{Cli, Commands};
use portal::services::posts::{PostSort, SortOrder};
use portal::store::Theme;

#[test]
fn imagine_accepts_named_and_pixel_sizes() {
    let cli = Cli::try_parse_from(["portal", "imagine", "a red kite", "--size", "portrait", "-n", "2"])
        .unwrap();
    match cli.command {
        Commands::Imagine {
            prompt, size, count, ..
        } => {
            assert_eq!(prompt, "a red kite");
            assert_eq!(size, ImageSize::Portrait);
            assert_eq!(count, 2);
        }
        other => panic!("unexpected command: {other:?}"),
    }

    let cli = Cli::try_parse_from(["portal", "imagine", "x", "--size", "1280*720"]).unwrap();
    assert!(matches!(
        cli.command,
        Commands::Imagine {
            size: ImageSize::Landscape,
            ..
        }
    ));
}

#[test]
fn unknown_size_is_rejected() {
    assert!(Cli::try_parse_from(["portal", "imagine", "x", "--size", "huge"]).is_err());
}

#[test]
fn post_listing_parses_sort_options() {
    let cli = Cli::try_parse_from([
        "portal",
        "--api-url",
        "http://localhost:9000/api/v1",
        "posts",
        "list",
        "--sort",
        "like_count",
        "--order",
        "asc",
        "--featured",
    ])
    .unwrap();
    assert_eq!(cli.api_url.as_deref(), Some("http://localhost:9000/api/v1"));
    match cli.command {
        Commands::Posts {
            action:
                PostsCommands::List {
                    sort,
                    order,
                    featured,
                    page,
                    ..
                },
        } => {
            assert_eq!(sort, Some(PostSort::LikeCount));
            assert_eq!(order, Some(SortOrder::Asc));
            assert!(featured);
            assert_eq!(page, 1);
        }
        other => panic!("unexpected command: {other:?}"),
    }
}

#[test]
fn preferences_set_takes_enum_values() {
    let cli = Cli::try_parse_from(["portal", "preferences", "set", "--theme", "light"]).unwrap();
    assert!(matches!(
        cli.command,
        Commands::Preferences {
            action: PreferencesCommands::Set {
                theme: Some(Theme::Light),
                locale: None,
                sidebar_collapsed: None,
            }
        }
    ));
}

#[test]
fn notifications_read_without_ids_means_all() {
    let cli = Cli::try_parse_from(["portal", "notifications", "read"]).unwrap();
    assert!(matches!(
        cli.command,
        Commands::Notifications {
            action: portal::cli::args::NotificationsCommands::Read { ids }
        } if ids.is_empty()
    ));
}
