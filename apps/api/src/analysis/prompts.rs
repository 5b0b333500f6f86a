// Prompt building for the analysis and chat endpoints.
// Both endpoints go through these functions so their instructions never drift apart.

use crate::models::analysis::Section;
use crate::models::research::{AnalysisInput, Category, ChatInput, Device};

/// Category guidance: what each audience type must emphasize.
fn category_prompt(category: Category) -> &'static str {
    match category {
        Category::Consumer => "[대국민/B2C] 불특정 다수가 사용하는 서비스입니다. 다음 관점을 반드시 반영해 분석하세요: \
            접근성(공공기관 웹 접근성 준수 여부, WCAG·KWCAG 등), 쉬운 사용성(비전문가도 이해하기 쉬운 UI·용어·플로우), \
            인클루시브 디자인. 공공·민간 대국민 서비스 사례를 참고하세요.",
        Category::Admin => "[업무용/Admin] 전문가가 사용하는 대형 시스템입니다. 다음 관점을 반드시 반영해 분석하세요: \
            업무 효율성(단축키·대량 처리·워크플로 최적화), 데이터 가독성(테이블·차트·필터·정렬), 역할별 권한·감사 로그. \
            ERP·관리자 콘솔·내부 업무 시스템 사례를 참고하세요.",
        Category::Infra => "[인프라/DX] 클라우드·기술 플랫폼·DX 솔루션입니다. 다음 관점을 반드시 반영해 분석하세요: \
            논리적 정보 구조(IA·네임스페이스·리소스 계층), 시스템 가시성(모니터링·대시보드·알림), API·설정·통합 UX. \
            DevOps·클라우드 콘솔·플랫폼 관리자 UX 사례를 참고하세요.",
    }
}

/// Device guidance: the physical constraints every analysis has to address.
fn device_prompt(device: Device) -> &'static str {
    match device {
        Device::Mobile => "[모바일/Mobile] 분석 관점을 모바일 디바이스 기준으로 완전히 가져가세요. \
반드시 다음 관점을 포함하고, 모든 분석 결과에서 선택된 디바이스의 물리적 제약과 특성을 언급하세요.
- **한 손 조작성**: 엄지 도달 영역, 단일 손가락 조작 가능 여부, 핫존 배치
- **터치 타겟 크기**: 최소 44×44pt 권장, 터치 간격·오조작 방지
- **하단 탭바 활용**: 주요 기능 하단 고정, 스와이프·제스처와의 조합
- **데이터 절약형 UI**: 이미지·동영상 최적화, 지연 로딩, 오프라인 대응
- **알림(Push) 전략**: 권한 요청 시점, 알림 빈도·내용, 딥링크 연동",
        Device::Web => "[웹/Web] 분석 관점을 웹 디바이스 기준으로 완전히 가져가세요. \
반드시 다음 관점을 포함하고, 모든 분석 결과에서 선택된 디바이스의 물리적 제약과 특성을 언급하세요.
- **넓은 해상도 활용**: 그리드 시스템(12/16컬럼), 반응형 브레이크포인트, 대형 모니터 대응
- **마우스 호버 효과**: 호버 시 피드백, 툴팁·드롭다운, 클릭 영역 명확성
- **복잡한 정보 구조(Navigation)**: 글로벌 내비·메가메뉴·사이드바·브레드크럼, IA 계층
- **멀티태스킹 편의성**: 탭·팝업·새 창, 복사·붙여넣기, 키보드 단축키",
    }
}

/// Header the model is told to put above each section's citations.
/// The response parser looks for the same token.
pub const REFERENCES_HEADER: &str = "참고 문헌 및 출처";

const REFERENCES_PROMPT: &str = "[참고 문헌 및 출처] 각 섹션 분석을 마칠 때, 해당 분석의 근거가 된 참고 문헌 및 출처를 답변 마지막에 반드시 포함하세요.
- 본문에서 인용할 때는 #출처1, #출처2, #출처3와 같이 구분자로 표기하세요.
- [참고 문헌 및 출처] 제목 아래에 각 출처를 한 줄씩 나열하세요. 형식: #출처1: 서비스명 또는 출처명, URL(선택)
- 실제 존재하는 웹사이트 URL이나 서비스·문서 명칭을 사용하세요. 예: Nielsen Norman Group, Toss UX 리포트, 정부24 웹 접근성 가이드라인, WCAG 2.1, Material Design Guidelines 등.";

const CLOSING_INSTRUCTION: &str =
    "[공통] 모든 분석 결과는 선택된 디바이스(모바일/웹)의 물리적 제약과 특성을 반드시 언급하세요.";

const CHAT_PERSONA: &str = "당신은 UX 리서치 에이전트입니다. 사용자의 리서치 목표, 타겟 사용자, \
    방법론 등을 듣고 플랜과 질문 초안을 도와줍니다.";

/// Which optional blocks go into the system instruction.
#[derive(Debug, Clone, Copy, Default)]
pub struct InstructionOptions {
    pub include_references: bool,
    pub device: Option<Device>,
}

/// Context line describing the user's selections, e.g.
/// `리서치 유형: 업무용/Admin, 디바이스: 웹, 주제: ERP 대시보드`.
pub fn build_analysis_context(input: &AnalysisInput) -> String {
    let mut parts = Vec::with_capacity(4);
    if let Some(category) = input.category {
        parts.push(format!("리서치 유형: {}", category.label()));
    }
    if let Some(sub_service) = input.sub_service.as_deref() {
        parts.push(format!("세부 서비스: {sub_service}"));
    }
    parts.push(format!("디바이스: {}", input.device.label()));
    parts.push(format!("주제: {}", input.topic.trim()));
    parts.join(", ")
}

/// Assembles the system instruction from the selected blocks.
/// Returns `None` when neither a category nor any option selects a block.
pub fn system_instruction(
    category: Option<Category>,
    options: InstructionOptions,
) -> Option<String> {
    let parts: Vec<&str> = [
        category.map(category_prompt),
        options.device.map(device_prompt),
        options.include_references.then_some(REFERENCES_PROMPT),
    ]
    .into_iter()
    .flatten()
    .collect();

    if parts.is_empty() {
        return None;
    }
    Some(format!("{}\n\n{CLOSING_INSTRUCTION}", parts.join("\n\n")))
}

/// System instruction used by the analysis endpoint: every block enabled for the input.
pub fn analysis_system_instruction(input: &AnalysisInput) -> Option<String> {
    system_instruction(
        input.category,
        InstructionOptions {
            include_references: true,
            device: Some(input.device),
        },
    )
}

/// User message for the analysis endpoint. Names the four section titles as the
/// required headings so the response parser can find them.
pub fn build_user_message(input: &AnalysisInput) -> String {
    let context = build_analysis_context(input);
    let headings = Section::ALL
        .iter()
        .map(|s| format!("# {}", s.title()))
        .collect::<Vec<_>>()
        .join(", ");

    format!(
        "다음 조건으로 UX 리서치 분석을 해주세요.\n\n{context}\n\n\
         응답은 반드시 다음 4개 섹션을 {headings} 제목으로 구분해서 작성해주세요. \
         각 섹션 제목 다음에 본문을 작성하고, 각 섹션 끝에 [{REFERENCES_HEADER}]를 포함해주세요."
    )
}

/// System prompt for the chat endpoint: persona plus whatever context the user picked.
pub fn chat_system_prompt(input: &ChatInput) -> String {
    let mut parts = vec![CHAT_PERSONA.to_string()];
    if let Some(category) = input.category {
        parts.push(format!("리서치 유형: {}", category.label()));
    }
    if let Some(sub_service) = input.sub_service.as_deref() {
        parts.push(format!("세부 서비스: {sub_service}"));
    }
    if let Some(device) = input.device {
        parts.push(format!("디바이스: {}", device.label()));
    }
    parts.join("\n")
}
