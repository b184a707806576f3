//! Built-in curriculum used when the catalog cannot be loaded.
//!
//! Three chapters; only the first one carries topics and content.

use crate::model::{
    AnswerChoice, Chapter, ChapterId, Concept, ContentId, Curriculum, Flashcard, QuizQuestion,
    Topic, TopicId,
};

type QuestionSpec<'a> = (&'a str, &'a str, [&'a str; 4], AnswerChoice);

struct TopicSpec<'a> {
    id: &'a str,
    title: &'a str,
    description: &'a str,
    example: &'a str,
    cards: [(&'a str, &'a str, &'a str); 3],
    questions: [QuestionSpec<'a>; 3],
}

const CHAPTERS: [(&str, &str); 3] = [
    ("fallback-1", "Capital Markets"),
    ("fallback-2", "Regulatory Framework"),
    ("fallback-3", "Securities Products"),
];

const TOPICS: [TopicSpec<'static>; 3] = [
    TopicSpec {
        id: "topic-1",
        title: "Market Structure",
        description: "Market structure refers to the organizational and functional \
            characteristics of a financial market. It shapes how participants interact, \
            how prices are discovered and how securities are traded. Key components are \
            market participants (buyers, sellers, intermediaries), trading mechanisms, \
            price discovery processes and market regulation.",
        example: "The New York Stock Exchange (NYSE) is a centralized exchange where buyers \
            and sellers meet to trade securities through a continuous auction process.",
        cards: [
            (
                "flash-1-1",
                "Primary Market",
                "The market where new securities are issued and sold to investors for the \
                 first time.",
            ),
            (
                "flash-1-2",
                "Secondary Market",
                "The market where existing securities are bought and sold among investors.",
            ),
            (
                "flash-1-3",
                "Market Maker",
                "A firm that stands ready to buy and sell a particular stock on a regular and \
                 continuous basis at publicly quoted prices.",
            ),
        ],
        questions: [
            (
                "quiz-1-1",
                "Which of the following is NOT a function of capital markets?",
                [
                    "Price discovery",
                    "Liquidity provision",
                    "Physical commodity delivery",
                    "Capital formation",
                ],
                AnswerChoice::C,
            ),
            (
                "quiz-1-2",
                "In which market are securities first issued to the public?",
                [
                    "Primary market",
                    "Secondary market",
                    "Tertiary market",
                    "Derivative market",
                ],
                AnswerChoice::A,
            ),
            (
                "quiz-1-3",
                "What is the main role of a market maker?",
                [
                    "To regulate markets",
                    "To provide liquidity",
                    "To issue new securities",
                    "To audit financial statements",
                ],
                AnswerChoice::B,
            ),
        ],
    },
    TopicSpec {
        id: "topic-2",
        title: "Economic Factors",
        description: "Economic factors are variables that influence the performance of \
            financial markets and securities. The main ones are interest rates, inflation, \
            GDP growth, employment data and consumer spending.",
        example: "When the Federal Reserve raises interest rates, bond prices typically fall \
            as yields rise to reflect the higher rates.",
        cards: [
            (
                "flash-2-1",
                "Inflation",
                "A general increase in prices and fall in the purchasing value of money.",
            ),
            (
                "flash-2-2",
                "GDP",
                "Gross Domestic Product: the total value of goods produced and services \
                 provided in a country during one year.",
            ),
            (
                "flash-2-3",
                "Yield Curve",
                "A line that plots yields of bonds having equal credit quality but differing \
                 maturity dates.",
            ),
        ],
        questions: [
            (
                "quiz-2-1",
                "Which economic indicator measures the change in prices of goods and services \
                 over time?",
                ["GDP", "Unemployment rate", "Inflation rate", "Trade balance"],
                AnswerChoice::C,
            ),
            (
                "quiz-2-2",
                "What typically happens to bond prices when interest rates rise?",
                [
                    "Bond prices rise",
                    "Bond prices fall",
                    "Bond prices remain unchanged",
                    "Bond prices become more volatile",
                ],
                AnswerChoice::B,
            ),
            (
                "quiz-2-3",
                "An inverted yield curve often indicates:",
                [
                    "Economic growth",
                    "Stable interest rates",
                    "A potential recession",
                    "Decreasing inflation",
                ],
                AnswerChoice::C,
            ),
        ],
    },
    TopicSpec {
        id: "topic-3",
        title: "Equity Markets",
        description: "Equity markets are where shares of companies are issued and traded. \
            They play a central role in capital formation. Important aspects are primary and \
            secondary markets, market indices, order types, participants and trading \
            mechanisms.",
        example: "An investor can place a limit order to buy shares at $150, which only \
            executes if the price falls to or below that level.",
        cards: [
            (
                "flash-3-1",
                "Market Index",
                "A measurement of the value of a section of the stock market, calculated from \
                 the prices of selected stocks.",
            ),
            (
                "flash-3-2",
                "Limit Order",
                "An order to buy or sell a security at a specific price or better.",
            ),
            (
                "flash-3-3",
                "Market Capitalization",
                "The total dollar market value of a company's outstanding shares of stock.",
            ),
        ],
        questions: [
            (
                "quiz-3-1",
                "Which of the following is a major stock market index in the United States?",
                ["DAX", "FTSE", "S&P 500", "Nikkei"],
                AnswerChoice::C,
            ),
            (
                "quiz-3-2",
                "What does market capitalization measure?",
                [
                    "A company's annual revenue",
                    "The total value of a company's outstanding shares",
                    "A company's profit margin",
                    "The number of employees in a company",
                ],
                AnswerChoice::B,
            ),
            (
                "quiz-3-3",
                "Which order type guarantees execution but not price?",
                ["Limit order", "Stop order", "Market order", "Day order"],
                AnswerChoice::C,
            ),
        ],
    },
];

/// The built-in curriculum.
#[must_use]
pub fn curriculum() -> Curriculum {
    let chapters: Vec<Chapter> = CHAPTERS
        .iter()
        .zip(1..)
        .map(|((id, title), order)| Chapter {
            id: ChapterId::new(*id),
            title: (*title).to_owned(),
            chapter_order: order,
        })
        .collect();
    let first_chapter = ChapterId::new(CHAPTERS[0].0);

    let mut curriculum = Curriculum {
        chapters,
        ..Curriculum::default()
    };

    for (entry, order) in TOPICS.iter().zip(1..) {
        let topic_id = TopicId::new(entry.id);
        curriculum.topics.push(Topic {
            id: topic_id.clone(),
            chapter_id: first_chapter.clone(),
            title: entry.title.to_owned(),
            description: None,
            topic_order: order,
        });
        curriculum.concepts.push(Concept {
            id: ContentId::from(&topic_id),
            topic_id: topic_id.clone(),
            title: entry.title.to_owned(),
            description: entry.description.to_owned(),
            example: Some(entry.example.to_owned()),
        });
        curriculum
            .flashcards
            .extend(entry.cards.iter().map(|(id, term, definition)| Flashcard {
                id: ContentId::new(*id),
                topic_id: topic_id.clone(),
                term: (*term).to_owned(),
                definition: (*definition).to_owned(),
            }));
        curriculum
            .questions
            .extend(entry.questions.iter().map(|(id, question, options, correct)| {
                QuizQuestion {
                    id: ContentId::new(*id),
                    topic_id: topic_id.clone(),
                    question: (*question).to_owned(),
                    options: options.map(str::to_owned),
                    correct: *correct,
                    explanation: None,
                }
            }));
    }

    curriculum
}
