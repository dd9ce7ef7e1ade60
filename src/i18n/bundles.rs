//! Static message bundles: default titles, file names and user notices per locale.

use crate::controller::events::UserNotice;
use crate::i18n::locales::Locale;
use crate::model::cell::GridState;
use crate::model::config::Variant;

/// Every string the core needs from a locale.
#[derive(Debug)]
pub struct Bundle {
    pub movie_main_title: &'static str,
    pub game_main_title: &'static str,
    pub movie_titles: [&'static str; 30],
    pub game_titles: [&'static str; 24],
    /// Template with a `{limit}` placeholder.
    pub file_too_large: &'static str,
    pub not_an_image: &'static str,
    pub undecodable: &'static str,
}

impl Bundle {
    pub fn main_title(&self, variant: Variant) -> &'static str {
        match variant {
            Variant::Movie => self.movie_main_title,
            Variant::Game => self.game_main_title,
        }
    }

    pub fn cell_titles(&self, variant: Variant) -> &[&'static str] {
        match variant {
            Variant::Movie => &self.movie_titles,
            Variant::Game => &self.game_titles,
        }
    }

    /// Export file stem used when the main title is blank.
    pub fn default_file_stem(&self, variant: Variant) -> &'static str {
        self.main_title(variant)
    }

    /// Fresh grid for `variant` with this bundle's titles.
    pub fn default_grid(&self, variant: Variant) -> GridState {
        GridState::from_titles(
            self.cell_titles(variant),
            variant.canvas_config().cell_count(),
            self.main_title(variant),
        )
    }

    pub fn notice(&self, notice: &UserNotice) -> String {
        match notice {
            UserNotice::FileTooLarge { limit } => self
                .file_too_large
                .replace("{limit}", &format_megabytes(*limit)),
            UserNotice::NotAnImage => self.not_an_image.to_string(),
            UserNotice::Undecodable => self.undecodable.to_string(),
        }
    }
}

fn format_megabytes(bytes: u64) -> String {
    const MIB: u64 = 1024 * 1024;
    if bytes % MIB == 0 {
        format!("{}MB", bytes / MIB)
    } else {
        format!("{:.1}MB", bytes as f64 / MIB as f64)
    }
}

impl Locale {
    pub fn bundle(self) -> &'static Bundle {
        match self {
            Self::ZhCn => &ZH_CN,
            Self::ZhTw => &ZH_TW,
            Self::En => &EN,
        }
    }
}

static EN: Bundle = Bundle {
    movie_main_title: "Movie Preference Grid",
    game_main_title: "Game Preference Grid",
    movie_titles: [
        "Favorite Movie",
        "Most Rewatched",
        "Most Underrated",
        "Most Overrated",
        "Best Soundtrack",
        "Best Cinematography",
        "Best Plot Twist",
        "Best Ending",
        "Favorite Director's Work",
        "Favorite Actor's Work",
        "Favorite Animation",
        "Favorite Documentary",
        "Favorite Comedy",
        "Favorite Horror",
        "Favorite Romance",
        "Favorite Sci-Fi",
        "Made Me Cry",
        "Made Me Laugh",
        "Scared Me Most",
        "First Seen in Theater",
        "Childhood Favorite",
        "Guilty Pleasure",
        "Most Recommendable",
        "Most Disappointing",
        "Best Villain",
        "Best Costume Design",
        "Best Script",
        "Want to Rewatch",
        "Watched Most Recently",
        "Hidden Gem",
    ],
    game_titles: [
        "Most Favorite",
        "Most Influential",
        "Most Stunning",
        "Longest Relationship",
        "Most Joyful",
        "Most Recommendable",
        "Best Story",
        "Best Visuals",
        "Best Music",
        "Best Voice Acting",
        "Favorite Character",
        "Best Ending",
        "Most Satisfying",
        "Most Painful",
        "Most Healing",
        "Most Depressing",
        "Most Underrated",
        "Most Overrated",
        "First Ever Played",
        "Time Killer",
        "Guilty Pleasure",
        "Someday I will finish",
        "Nostalgia Hit",
        "Beloved Hidden Gem",
    ],
    file_too_large: "File too large, please choose an image under {limit}",
    not_an_image: "Please drop an image file",
    undecodable: "This image could not be read",
};

static ZH_CN: Bundle = Bundle {
    movie_main_title: "电影生涯个人喜好表",
    game_main_title: "游戏生涯个人喜好表",
    movie_titles: [
        "最爱的",
        "看过最多遍的",
        "最被低估的",
        "最被高估的",
        "最喜欢的配乐",
        "最喜欢的摄影",
        "最意想不到的反转",
        "最喜欢的结局",
        "最喜欢的导演作品",
        "最喜欢的演员作品",
        "最喜欢的动画",
        "最喜欢的纪录片",
        "最喜欢的喜剧",
        "最喜欢的恐怖片",
        "最喜欢的爱情片",
        "最喜欢的科幻片",
        "哭得最惨的",
        "笑得最开心的",
        "最吓人的",
        "第一部在影院看的",
        "童年回忆",
        "我咋会喜欢这个",
        "最想安利的",
        "最失望的",
        "最喜欢的反派",
        "最喜欢的造型",
        "最喜欢的剧本",
        "还想再看的",
        "最近看的",
        "它好小众我好爱",
    ],
    game_titles: [
        "最爱的",
        "最影响我的",
        "最惊艳的",
        "最长情的",
        "最快乐的",
        "最想安利的",
        "最喜欢的剧情",
        "最喜欢的画面",
        "最喜欢的配乐",
        "最喜欢的配音",
        "最喜欢的角色",
        "最喜欢的结局",
        "最爽快的",
        "最受苦的",
        "最治愈的",
        "最致郁的",
        "最被低估的",
        "最被高估的",
        "玩的第一款",
        "消磨时间就玩",
        "我咋会喜欢这个",
        "总有一天能打完",
        "爷青回",
        "它好小众我好爱",
    ],
    file_too_large: "文件过大，请选择小于{limit}的图片",
    not_an_image: "请拖入图片文件",
    undecodable: "无法读取该图片",
};

static ZH_TW: Bundle = Bundle {
    movie_main_title: "電影生涯個人喜好表",
    game_main_title: "遊戲生涯個人喜好表",
    movie_titles: [
        "最喜愛的",
        "看過最多遍的",
        "最被低估的",
        "最被高估的",
        "最喜歡的配樂",
        "最喜歡的攝影",
        "最意想不到的反轉",
        "最喜歡的結局",
        "最喜歡的導演作品",
        "最喜歡的演員作品",
        "最喜歡的動畫",
        "最喜歡的紀錄片",
        "最喜歡的喜劇",
        "最喜歡的恐怖片",
        "最喜歡的愛情片",
        "最喜歡的科幻片",
        "哭得最慘的",
        "笑得最開心的",
        "最嚇人的",
        "第一部在影院看的",
        "童年回憶",
        "我怎會喜歡這個",
        "最想安利的",
        "最失望的",
        "最喜歡的反派",
        "最喜歡的造型",
        "最喜歡的劇本",
        "還想再看的",
        "最近看的",
        "它好小眾我好愛",
    ],
    game_titles: [
        "最喜愛的",
        "最影響我的",
        "最驚豔的",
        "最長情的",
        "最快樂的",
        "最想安利的",
        "最喜歡的劇情",
        "最喜歡的畫面",
        "最喜歡的配樂",
        "最喜歡的配音",
        "最喜歡的角色",
        "最喜歡的結局",
        "最爽快的",
        "最受苦的",
        "最治癒的",
        "最致鬱的",
        "最被低估的",
        "最被高估的",
        "玩的第一款",
        "消磨時間就玩",
        "我怎會喜歡這個",
        "總有一天能打完",
        "爺青回",
        "它好小眾我好愛",
    ],
    file_too_large: "檔案過大，請選擇小於{limit}的圖片",
    not_an_image: "請拖入圖片檔案",
    undecodable: "無法讀取該圖片",
};

#[cfg(test)]
#[path = "../../tests/unit/i18n/bundles.rs"]
mod tests;
