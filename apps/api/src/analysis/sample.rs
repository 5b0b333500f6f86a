/// Fixed chat answer used whenever the model cannot be reached, so a demo without network
/// access still shows a plausible result. Headed with the report section titles.
pub const SAMPLE_RESEARCH_TEXT: &str = "# 시장 현황
kt ds가 서비스하는 B2B·공공·인프라 도메인에서 UX 리서치 수요가 연평균 15% 이상 성장하고 있습니다. 특히 통신사 내부 업무 시스템, 공공 포털, 클라우드 콘솔 등에서 사용성 개선과 접근성 준수 요구가 높아지고 있으며, NPS 및 업무 효율성 지표가 예산 편성의 근거로 활용되는 추세입니다.

# UI/UX 패턴 분석
• **대국민/공공**: 메가메뉴·단계별 안내·WCAG 준수 패턴이 표준화되고 있으며, 키보드만으로 전체 플로우 조작이 가능한 패턴이 권장됩니다.
• **업무용/Admin**: 대시보드 위젯·필터·대용량 테이블 정렬·결재 라인 UI 패턴이 도입 사례별로 정리되어 있고, 단축키와 벌크 액션이 필수 요건으로 다뤄집니다.
• **인프라/DX**: 리소스 트리·모니터링 차트·알림 규칙 설정·API 문서 연동 UI 패턴이 클라우드 벤더 가이드와 내부 디자인 시스템에 반영되고 있습니다.

# 장단점 비교
**장점**: kt ds 영역의 실제 도메인 지식과 접근성·효율성 요구를 반영한 리서치 플랜을 빠르게 도출할 수 있음.
**단점**: 도메인 전문가 검수와 실제 사용자 테스트 없이 가이드만 적용할 경우 현장 이슈가 누락될 수 있음.
**적용 포인트**: 시연·제안 단계에서는 본 샘플과 같은 구조화된 포맷으로 제시하고, 실제 프로젝트에서는 타겟 사용자 인터뷰와 휴리스틱 평가를 병행하는 것을 권장합니다.

# 인사이트 도출
• 리서치 목표와 타겟(대국민/업무용/인프라)을 먼저 정의하면, 적합한 방법론(인터뷰, 사용성 테스트, 휴리스틱 평가) 선정이 수월합니다.
• kt ds 업무 맥락에서는 접근성(WCAG)·업무 효율성·시스템 가시성 중 어떤 축을 우선할지에 따라 질문 초안과 플랜이 달라집니다.
• 본 응답은 네트워크 또는 API 연결이 되지 않은 환경에서 표시되는 샘플 데이터입니다.";
