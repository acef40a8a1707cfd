use anyhow::Context;
use chrono::{Duration, TimeZone, Utc};
use colloquy_api::RawComment;
use colloquy_client::Forest;
use rand::{rngs::StdRng, Rng, SeedableRng};
use serde_json::{json, Value};

const AUTHORS: &[&str] = &["ada", "grace", "linus", "barbara", "ken"];
const BADGES: &[&str] = &["Member", "Author", "Moderator", "Beta Reader"];

#[derive(structopt::StructOpt)]
struct Opt {
    /// Number of posts the comments are spread over
    #[structopt(long, default_value = "5")]
    posts: i64,

    /// Number of comments to generate
    #[structopt(long, default_value = "200")]
    comments: usize,

    /// Probability for a comment to be a reply rather than a root comment
    #[structopt(long, default_value = "0.7")]
    reply_ratio: f64,

    /// Probability for a reply to point to a comment that does not exist
    #[structopt(long, default_value = "0.05")]
    orphan_ratio: f64,

    #[structopt(long, default_value = "0")]
    seed: u64,

    /// Print per-post comment counts of the generated batch to stderr
    #[structopt(long)]
    summary: bool,
}

fn gen_author(rng: &mut StdRng) -> Value {
    let name = AUTHORS[rng.gen_range(0..AUTHORS.len())];
    match rng.gen_range(0..4) {
        0 => json!({
            "name": name,
            "avatar": format!("/avatars/{name}.png"),
            "reputation": rng.gen_range(0..5000),
            "badge": BADGES[rng.gen_range(0..BADGES.len())],
        }),
        1 => json!({
            "username": name,
            "profile_image": format!("/avatars/{name}.png"),
            "score": rng.gen_range(0..5000).to_string(),
            "role": BADGES[rng.gen_range(0..BADGES.len())],
        }),
        2 => json!(name),
        _ => Value::Null,
    }
}

fn gen_reference(rng: &mut StdRng, id: i64) -> Value {
    match rng.gen_range(0..3) {
        0 => json!(id),
        1 => json!(id.to_string()),
        _ => json!({ "id": id }),
    }
}

fn main() -> anyhow::Result<()> {
    let opt = <Opt as structopt::StructOpt>::from_args();
    let mut rng = StdRng::seed_from_u64(opt.seed);
    let start = Utc
        .with_ymd_and_hms(2024, 1, 1, 0, 0, 0)
        .single()
        .context("building start date")?;

    let mut posts = Vec::with_capacity(opt.comments);
    let mut batch = Vec::with_capacity(opt.comments);
    for i in 0..opt.comments {
        let id = i as i64 + 1;
        let created = start + Duration::minutes(rng.gen_range(0..60 * 24 * 30));
        let mut post = rng.gen_range(1..=opt.posts.max(1));
        let parent = if i > 0 && rng.gen_bool(opt.reply_ratio) {
            if rng.gen_bool(opt.orphan_ratio) {
                Some(10_000_000 + id)
            } else {
                let parent = rng.gen_range(0..i);
                post = posts[parent];
                Some(parent as i64 + 1)
            }
        } else {
            None
        };
        posts.push(post);

        let words = rng.gen_range(3..40);
        let mut c = json!({
            "id": id,
            "body": lipsum::lipsum_words_from_seed(words, rng.gen()),
            "author": gen_author(&mut rng),
            "created_at": created.to_rfc3339(),
            "post": gen_reference(&mut rng, post),
        });
        if let Some(parent) = parent {
            c["parent"] = gen_reference(&mut rng, parent);
        }
        if rng.gen_bool(0.1) {
            c["updated_at"] = json!((created + Duration::hours(1)).to_rfc3339());
        }
        batch.push(c);
    }

    println!(
        "{}",
        serde_json::to_string_pretty(&batch).context("serializing generated batch")?
    );

    if opt.summary {
        let raws = batch.into_iter().map(RawComment).collect::<Vec<_>>();
        let forest = Forest::build(&raws);
        for (post, count) in forest.reply_counts() {
            let roots = forest.roots(post).len();
            match post.is_unassigned() {
                true => eprintln!("unassigned: {count} comments, {roots} roots"),
                false => eprintln!("post {}: {count} comments, {roots} roots", post.0),
            }
        }
    }

    Ok(())
}
