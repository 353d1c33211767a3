use core::num::NonZeroU32;

use crate::board::Intent;
use crate::entities::{split_tags, Field, PostDraft, Profile};

use super::{DraftArgs, DraftChanges, ListCmd, ProfileCmd};

pub fn parse_nonzero_num(
    s: &str,
) -> ::core::result::Result<u32, <NonZeroU32 as ::core::str::FromStr>::Err> {
    Ok(s.parse::<NonZeroU32>()?.get())
}

impl ListCmd {
    /// Intents layered over the query already in the address.
    pub fn intents(&self) -> Vec<Intent> {
        let mut intents = vec![];

        if let Some(q) = &self.q {
            intents.push(Intent::Search(q.clone()));
        }

        self.tag
            .iter()
            .for_each(|t| intents.push(Intent::ToggleTag(t.clone())));

        for (field, value) in self.fields() {
            if let Some(v) = value {
                intents.push(Intent::SetField(field, v.clone()));
            }
        }

        if let Some(s) = self.sort {
            intents.push(Intent::Sort(s));
        }

        if self.saved {
            intents.push(Intent::SavedOnly(true));
        }

        // pages are reached the way the list reaches them
        (1..self.page).for_each(|_| intents.push(Intent::LoadMore));

        intents
    }

    fn fields(&self) -> [(Field, &Option<String>); 5] {
        [
            (Field::Game, &self.game),
            (Field::Level, &self.level),
            (Field::Lang, &self.lang),
            (Field::Platform, &self.platform),
            (Field::Time, &self.time),
        ]
    }
}

impl DraftArgs {
    pub fn into_draft(self) -> PostDraft {
        PostDraft {
            title: self.title,
            game: self.game,
            level: self.level,
            lang: self.lang,
            platform: self.platform,
            time: self.time,
            tags: split_tags(&self.tags),
            desc: self.desc,
        }
    }
}

impl DraftChanges {
    pub fn apply(self, mut draft: PostDraft) -> PostDraft {
        let DraftChanges {
            title,
            game,
            level,
            lang,
            platform,
            time,
            tags,
            desc,
        } = self;

        macro_rules! overwrite {
            ($($f:ident),*) => {$(
                if let Some(v) = $f {
                    draft.$f = v;
                }
            )*};
        }
        overwrite!(title, game, level, lang, platform, time, desc);

        if let Some(t) = tags {
            draft.tags = split_tags(&t);
        }

        draft
    }
}

impl ProfileCmd {
    pub fn apply(self, mut profile: Profile) -> Profile {
        if let Some(a) = self.avatar {
            profile.avatar_url = Some(a).filter(|a| !a.is_empty());
        }

        if let Some(b) = self.bio {
            profile.bio = Some(b).filter(|b| !b.is_empty());
        }

        profile
    }
}

#[cfg(test)]
mod tests {
    use clap::Parser;

    use super::*;
    use crate::board::SortMode;
    use crate::cmds::{App, RootMod};

    fn parse(args: &[&str]) -> RootMod {
        let mut argv = vec!["squad_board"];
        argv.extend_from_slice(args);
        App::try_parse_from(argv).unwrap().cmd
    }

    #[test]
    fn list_flags_become_intents() {
        let cmd = match parse(&["list", "-q", "raid", "--tag", "mic", "--game", "WoW", "--sort", "date", "--page", "3"]) {
            RootMod::List(c) => c,
            c => panic!("unexpected {:?}", c),
        };

        assert_eq!(cmd.intents(), vec![
            Intent::Search("raid".to_string()),
            Intent::ToggleTag("mic".to_string()),
            Intent::SetField(Field::Game, "WoW".to_string()),
            Intent::Sort(SortMode::Date),
            Intent::LoadMore,
            Intent::LoadMore,
        ]);
    }

    #[test]
    fn zero_page_is_rejected() {
        assert!(App::try_parse_from(["squad_board", "list", "--page", "0"]).is_err());
    }

    #[test]
    fn edit_keeps_untouched_fields() {
        let base = PostDraft {
            title: "old".to_string(),
            game: "Dota 2".to_string(),
            ..PostDraft::default()
        };
        let changes = DraftChanges {
            title: Some("new".to_string()),
            tags: Some("a, b".to_string()),
            ..DraftChanges::default()
        };

        let draft = changes.apply(base);
        assert_eq!(draft.title, "new");
        assert_eq!(draft.game, "Dota 2");
        assert_eq!(draft.tags.len(), 2);
    }
}
